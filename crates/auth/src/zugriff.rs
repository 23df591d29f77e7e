//! Zugriffssteuerung auf NVR-Ebene
//!
//! Admins sehen alles; die Rolle wird vor jeder Freigabe-Abfrage geprueft.
//! Viewer sehen die ihnen freigegebenen NVRs, deren Kameras und zusaetzlich
//! alle Kameras ohne NVR.

use std::collections::BTreeSet;
use std::sync::Arc;

use opus_core::{NvrId, UserId};
use opus_db::models::{BenutzerRecord, KameraRecord};
use opus_db::{CameraRepository, GrantRepository, NvrRepository, UserRepository};

use crate::error::{AuthError, AuthResult};

pub struct ZugriffService<R> {
    repo: Arc<R>,
}

impl<R> ZugriffService<R>
where
    R: UserRepository + NvrRepository + CameraRepository + GrantRepository,
{
    pub fn neu(repo: Arc<R>) -> Self {
        Self { repo }
    }

    /// IDs aller NVRs, die der Benutzer sehen darf
    pub async fn sichtbare_nvrs(&self, benutzer: &BenutzerRecord) -> AuthResult<Vec<NvrId>> {
        if benutzer.role.ist_admin() {
            return Ok(NvrRepository::list_ids(&*self.repo).await?);
        }
        Ok(self.repo.list_for_user(benutzer.id).await?)
    }

    /// Kameras sichtbarer NVRs plus alle Kameras ohne NVR, nach Name sortiert
    pub async fn sichtbare_kameras(&self, benutzer: &BenutzerRecord) -> AuthResult<Vec<KameraRecord>> {
        let kameras = CameraRepository::list(&*self.repo).await?;
        if benutzer.role.ist_admin() {
            return Ok(kameras);
        }

        let freigegeben: BTreeSet<NvrId> = self
            .repo
            .list_for_user(benutzer.id)
            .await?
            .into_iter()
            .collect();

        Ok(kameras
            .into_iter()
            .filter(|k| k.nvr_id.map_or(true, |id| freigegeben.contains(&id)))
            .collect())
    }

    /// Freigegebene NVR-IDs eines Benutzers
    pub async fn freigaben(&self, user_id: UserId) -> AuthResult<Vec<NvrId>> {
        self.benutzer_laden(user_id).await?;
        Ok(self.repo.list_for_user(user_id).await?)
    }

    /// Ersetzt alle Freigaben eines Viewers
    ///
    /// Doppelte IDs werden zusammengefasst. Existiert eine ID nicht, bleibt
    /// der alte Stand unveraendert. Gibt die gespeicherten IDs zurueck.
    pub async fn freigaben_setzen(&self, user_id: UserId, nvr_ids: &[NvrId]) -> AuthResult<Vec<NvrId>> {
        let benutzer = self.benutzer_laden(user_id).await?;
        if benutzer.role.ist_admin() {
            return Err(AuthError::validierung(
                "Admins haben immer vollen Zugriff, Freigaben gelten nicht",
            ));
        }

        let eindeutig: Vec<NvrId> = nvr_ids
            .iter()
            .copied()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        for nvr_id in &eindeutig {
            if !NvrRepository::exists(&*self.repo, *nvr_id).await? {
                return Err(AuthError::nicht_gefunden(format!("NVR {nvr_id}")));
            }
        }

        self.repo.replace_for_user(user_id, &eindeutig).await?;
        tracing::info!(
            user_id = %user_id,
            username = %benutzer.username,
            anzahl = eindeutig.len(),
            "NVR-Freigaben ersetzt"
        );
        Ok(eindeutig)
    }

    async fn benutzer_laden(&self, user_id: UserId) -> AuthResult<BenutzerRecord> {
        UserRepository::get_by_id(&*self.repo, user_id)
            .await?
            .ok_or_else(|| AuthError::nicht_gefunden(format!("Benutzer {user_id}")))
    }
}
