//! Integration-Tests fuer CameraRepository (In-Memory SQLite)

use opus_core::{KameraId, NvrId};
use opus_db::{
    models::{KameraUpdate, NeueKamera, NeuerNvr},
    CameraRepository, DbError, NvrRepository, SqliteDb,
};

async fn db() -> SqliteDb {
    SqliteDb::in_memory()
        .await
        .expect("In-Memory DB konnte nicht erstellt werden")
}

async fn nvr(db: &SqliteDb, name: &str) -> NvrId {
    NvrRepository::create(
        db,
        NeuerNvr {
            name,
            display_name: name,
            ..Default::default()
        },
    )
    .await
    .expect("NVR erstellen fehlgeschlagen")
    .id
}

#[tokio::test]
async fn kamera_erstellen_und_laden() {
    let db = db().await;
    let nvr_id = nvr(&db, "dock").await;

    let kamera = CameraRepository::create(
        &db,
        NeueKamera {
            name: "dock-ch1-main",
            display_name: "Dock — Ch 1 Main",
            rtsp_url: "rtsp://admin:pw@10.0.0.5:554/Streaming/Channels/101",
            nvr_id: Some(nvr_id),
            notes: Some("Rampe"),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    assert!(kamera.active);
    assert!(!kamera.recording_enabled);

    let geladen = CameraRepository::get_by_name(&db, "dock-ch1-main")
        .await
        .unwrap()
        .expect("Kamera sollte gefunden werden");
    assert_eq!(geladen, kamera);
    assert_eq!(geladen.notes.as_deref(), Some("Rampe"));
}

#[tokio::test]
async fn kamera_name_unique() {
    let db = db().await;

    let neu = NeueKamera {
        name: "eingang",
        display_name: "Eingang",
        rtsp_url: "rtsp://a",
        ..Default::default()
    };
    CameraRepository::create(&db, neu.clone()).await.unwrap();

    let err = CameraRepository::create(&db, neu).await.unwrap_err();
    assert!(err.ist_eindeutigkeit());
    assert!(matches!(err, DbError::Eindeutigkeit(_)));
}

#[tokio::test]
async fn kamera_mit_unbekanntem_nvr_schlaegt_fehl() {
    let db = db().await;

    let err = CameraRepository::create(
        &db,
        NeueKamera {
            name: "waise",
            display_name: "Waise",
            rtsp_url: "rtsp://a",
            nvr_id: Some(NvrId(42)),
            ..Default::default()
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, DbError::UngueltigeDaten(_)));
}

#[tokio::test]
async fn exists_by_name_ist_case_sensitiv() {
    let db = db().await;

    CameraRepository::create(
        &db,
        NeueKamera {
            name: "Lager-Cam",
            display_name: "Lager",
            rtsp_url: "rtsp://a",
            ..Default::default()
        },
    )
    .await
    .unwrap();

    assert!(CameraRepository::exists_by_name(&db, "Lager-Cam").await.unwrap());
    assert!(!CameraRepository::exists_by_name(&db, "lager-cam").await.unwrap());
}

#[tokio::test]
async fn kamera_aktualisieren() {
    let db = db().await;
    let nvr_id = nvr(&db, "hof").await;

    let kamera = CameraRepository::create(
        &db,
        NeueKamera {
            name: "hof-ch1-main",
            display_name: "Hof",
            rtsp_url: "rtsp://a",
            nvr_id: Some(nvr_id),
            notes: Some("alt"),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let aktualisiert = CameraRepository::update(
        &db,
        kamera.id,
        KameraUpdate {
            name: Some("hof-neu".into()),
            recording_enabled: Some(true),
            nvr_id: Some(None),
            notes: Some(None),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    assert_eq!(aktualisiert.name, "hof-neu");
    assert!(aktualisiert.recording_enabled);
    assert_eq!(aktualisiert.nvr_id, None);
    assert_eq!(aktualisiert.notes, None);
    assert_eq!(aktualisiert.rtsp_url, "rtsp://a");
}

#[tokio::test]
async fn leeres_update_liefert_unveraenderte_kamera() {
    let db = db().await;

    let kamera = CameraRepository::create(
        &db,
        NeueKamera {
            name: "x",
            display_name: "X",
            rtsp_url: "rtsp://x",
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let gleich = CameraRepository::update(&db, kamera.id, KameraUpdate::default())
        .await
        .unwrap();
    assert_eq!(gleich, kamera);

    let err = CameraRepository::update(&db, KameraId(999), KameraUpdate::default())
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::NichtGefunden(_)));
}

#[tokio::test]
async fn aktive_und_nvr_listen() {
    let db = db().await;
    let a = nvr(&db, "a").await;
    let b = nvr(&db, "b").await;

    for (name, nvr_id, active) in [
        ("a-2", Some(a), true),
        ("a-1", Some(a), false),
        ("b-1", Some(b), true),
        ("frei", None, true),
    ] {
        CameraRepository::create(
            &db,
            NeueKamera {
                name,
                display_name: name,
                rtsp_url: "rtsp://x",
                nvr_id,
                active,
                ..Default::default()
            },
        )
        .await
        .unwrap();
    }

    let namen = |v: Vec<opus_db::models::KameraRecord>| {
        v.into_iter().map(|k| k.name).collect::<Vec<_>>()
    };

    assert_eq!(
        namen(CameraRepository::list(&db).await.unwrap()),
        vec!["a-1", "a-2", "b-1", "frei"]
    );
    assert_eq!(
        namen(CameraRepository::list_active(&db).await.unwrap()),
        vec!["a-2", "b-1", "frei"]
    );
    assert_eq!(
        namen(CameraRepository::list_by_nvr(&db, a).await.unwrap()),
        vec!["a-1", "a-2"]
    );
    assert_eq!(CameraRepository::count_by_nvr(&db, b).await.unwrap(), 1);
}

#[tokio::test]
async fn kamera_loeschen() {
    let db = db().await;

    let kamera = CameraRepository::create(
        &db,
        NeueKamera {
            name: "weg",
            display_name: "Weg",
            rtsp_url: "rtsp://x",
            ..Default::default()
        },
    )
    .await
    .unwrap();

    assert!(CameraRepository::delete(&db, kamera.id).await.unwrap());
    assert!(CameraRepository::get_by_id(&db, kamera.id)
        .await
        .unwrap()
        .is_none());
    assert!(!CameraRepository::delete(&db, kamera.id).await.unwrap());
}
