//! Benutzerverwaltung
//!
//! Anlegen, Bearbeiten und Loeschen von Benutzern, Pruefung von Anmeldedaten
//! und das Anlegen eines Standard-Admins auf einer leeren Datenbank.

use std::sync::Arc;

use opus_core::{Rolle, UserId};
use opus_db::models::{BenutzerRecord, BenutzerUpdate, NeuerBenutzer};
use opus_db::UserRepository;

use crate::error::{AuthError, AuthResult};
use crate::password::{passwort_hashen, passwort_verifizieren};

/// Teil-Aenderung eines Benutzers; ein leeres Passwort aendert nichts
#[derive(Debug, Clone, Default)]
pub struct BenutzerPatch {
    pub username: Option<String>,
    pub passwort: Option<String>,
    pub rolle: Option<String>,
}

pub struct BenutzerService<U: UserRepository> {
    user_repo: Arc<U>,
}

impl<U: UserRepository> BenutzerService<U> {
    pub fn neu(user_repo: Arc<U>) -> Self {
        Self { user_repo }
    }

    pub async fn laden(&self, id: UserId) -> AuthResult<BenutzerRecord> {
        self.user_repo
            .get_by_id(id)
            .await?
            .ok_or_else(|| AuthError::nicht_gefunden(format!("Benutzer {id}")))
    }

    /// Alle Benutzer, nach Name sortiert
    pub async fn auflisten(&self) -> AuthResult<Vec<BenutzerRecord>> {
        Ok(self.user_repo.list().await?)
    }

    pub async fn erstellen(
        &self,
        username: &str,
        passwort: &str,
        rolle: &str,
    ) -> AuthResult<BenutzerRecord> {
        let username = username.trim();
        if username.is_empty() || passwort.is_empty() {
            return Err(AuthError::validierung(
                "username und password sind Pflichtfelder",
            ));
        }
        let rolle = rolle_parsen(rolle)?;

        if self.user_repo.get_by_name(username).await?.is_some() {
            return Err(AuthError::validierung(format!(
                "Benutzername '{username}' bereits vergeben"
            )));
        }

        let passwort_hash = passwort_hashen(passwort)?;
        let benutzer = self
            .user_repo
            .create(NeuerBenutzer {
                username,
                password_hash: &passwort_hash,
                role: rolle,
            })
            .await?;

        tracing::info!(
            user_id = %benutzer.id,
            username = %benutzer.username,
            rolle = %benutzer.role,
            "Benutzer angelegt"
        );
        Ok(benutzer)
    }

    pub async fn aktualisieren(&self, id: UserId, patch: BenutzerPatch) -> AuthResult<BenutzerRecord> {
        let alt = self.laden(id).await?;
        let mut update = BenutzerUpdate::default();

        if let Some(username) = patch.username {
            let username = username.trim();
            if username.is_empty() {
                return Err(AuthError::validierung("username darf nicht leer sein"));
            }
            if username != alt.username {
                // Konflikt nur mit anderen Benutzern
                if let Some(anderer) = self.user_repo.get_by_name(username).await? {
                    if anderer.id != id {
                        return Err(AuthError::validierung(format!(
                            "Benutzername '{username}' bereits vergeben"
                        )));
                    }
                }
                update.username = Some(username.to_string());
            }
        }
        if let Some(rolle) = patch.rolle {
            update.role = Some(rolle_parsen(&rolle)?);
        }
        if let Some(passwort) = patch.passwort.filter(|p| !p.is_empty()) {
            update.password_hash = Some(passwort_hashen(&passwort)?);
        }

        let benutzer = self.user_repo.update(id, update).await?;
        tracing::info!(user_id = %id, "Benutzer aktualisiert");
        Ok(benutzer)
    }

    /// Loescht einen Benutzer; das eigene Konto ist ausgenommen
    pub async fn loeschen(&self, akteur: UserId, id: UserId) -> AuthResult<()> {
        let benutzer = self.laden(id).await?;
        if benutzer.id == akteur {
            return Err(AuthError::SelbstLoeschung);
        }

        self.user_repo.delete(id).await?;
        tracing::info!(user_id = %id, username = %benutzer.username, "Benutzer geloescht");
        Ok(())
    }

    pub async fn anmeldedaten_pruefen(
        &self,
        username: &str,
        passwort: &str,
    ) -> AuthResult<BenutzerRecord> {
        let benutzer = self
            .user_repo
            .get_by_name(username.trim())
            .await?
            .ok_or(AuthError::UngueltigeAnmeldedaten)?;

        if !passwort_verifizieren(passwort, &benutzer.password_hash)? {
            tracing::warn!(username = %benutzer.username, "Fehlgeschlagener Login-Versuch");
            return Err(AuthError::UngueltigeAnmeldedaten);
        }
        Ok(benutzer)
    }

    /// Legt einen Admin an, sofern noch kein einziger Benutzer existiert
    pub async fn standard_admin_anlegen(
        &self,
        username: &str,
        passwort: &str,
    ) -> AuthResult<Option<BenutzerRecord>> {
        if self.user_repo.count().await? > 0 {
            return Ok(None);
        }

        let admin = self
            .erstellen(username, passwort, Rolle::Admin.als_str())
            .await?;
        tracing::warn!(
            username = %admin.username,
            "Standard-Admin angelegt, Passwort nach der ersten Anmeldung aendern"
        );
        Ok(Some(admin))
    }
}

fn rolle_parsen(rolle: &str) -> AuthResult<Rolle> {
    rolle
        .parse()
        .map_err(|e: opus_core::RolleUngueltig| AuthError::validierung(e.to_string()))
}
