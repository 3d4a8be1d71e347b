use api::{GeoQuestConfig, Registration};
use chrono::{Local, Utc};
use store::config::Backend;
use store::dates::start_of_month;
use store::{DateRange, LocationRecord, MemoryStore, Page, Visibility};
use ui::{App, DateFilter};

fn form(email: &str) -> Registration {
    Registration::new("Lerato Khumalo", "lerato", email, "summit42")
}

fn names(app: &App<impl store::DocumentStore>) -> Vec<String> {
    app.locations
        .state()
        .locations
        .into_iter()
        .map(|l| l.name)
        .collect()
}

#[tokio::test]
async fn register_add_and_filter_logbook() {
    let mut app = App::with_store(MemoryStore::new(), &GeoQuestConfig::default()).unwrap();

    app.users.register(&form("lerato@example.com")).await;
    let session = app.users.session().expect("registered user is signed in");
    app.sync_session().await;
    assert!(names(&app).is_empty());

    let old = LocationRecord::new(session.user_id(), "Drakensberg", -28.75, 29.25)
        .added_at(1_577_880_000_000);
    let fresh = LocationRecord::new(session.user_id(), "Sani Pass", -29.58, 29.29)
        .with_description("Top of the pass");
    assert!(app.locations.add_location(&old).await.is_some());
    assert!(app.locations.add_location(&fresh).await.is_some());

    // Writes re-run the logbook's own query
    assert_eq!(names(&app), ["Sani Pass", "Drakensberg"]);

    app.logbook.select(DateFilter::ThisMonth).await;
    assert_eq!(names(&app), ["Sani Pass"]);

    let now = Local::now();
    let month = DateRange::between(&start_of_month(&now).unwrap(), &now).unwrap();
    let direct = app
        .locations
        .repository()
        .get_user_locations_by_date_range(session.user_id(), month, Page::first())
        .await
        .unwrap();
    assert_eq!(app.locations.state().locations, direct.locations);

    app.users.logout().await;
    app.sync_session().await;
    assert!(names(&app).is_empty());
}

#[tokio::test]
async fn private_records_stay_out_of_public_discovery() {
    let app = App::with_store(MemoryStore::new(), &GeoQuestConfig::default()).unwrap();
    app.users.register(&form("lerato@example.com")).await;
    let me = app.users.session().unwrap();

    app.locations
        .add_location(&LocationRecord::new(me.user_id(), "Home", -26.1, 28.0).with_visibility(Visibility::Private))
        .await
        .unwrap();
    app.locations
        .add_location(&LocationRecord::new(me.user_id(), "Park", -26.2, 28.1))
        .await
        .unwrap();

    let everything = DateRange::new(0, Utc::now().timestamp_millis() + 1_000).unwrap();
    app.locations.load_public_locations_by_date_range(everything).await;
    assert_eq!(names(&app), ["Park"]);

    app.locations
        .load_user_locations_by_date_range_and_visibility(me.user_id(), everything, Visibility::Private)
        .await;
    assert_eq!(names(&app), ["Home"]);
}

#[tokio::test]
async fn duplicate_account_and_bad_password() {
    let app = App::with_store(MemoryStore::new(), &GeoQuestConfig::default()).unwrap();
    app.users.register(&form("lerato@example.com")).await;
    app.users.logout().await;

    app.users.register(&form("LERATO@example.com")).await;
    assert_eq!(
        app.users.state().error_message.as_deref(),
        Some("User with this email already exists")
    );

    app.users.login("lerato@example.com", "summit43").await;
    let state = app.users.state();
    assert_eq!(state.error_message.as_deref(), Some("Invalid email or password"));
    assert!(state.session.is_none());
}

#[tokio::test]
async fn file_backed_app_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = GeoQuestConfig::default();
    config.store.backend = Backend::File;
    config.store.path = dir.path().display().to_string();

    let first = App::from_config(&config).unwrap();
    first.users.register(&form("lerato@example.com")).await;
    let user_id = first.users.session().unwrap().user_id().to_string();
    first
        .locations
        .add_location(&LocationRecord::new(&user_id, "Golden Gate", -28.5, 28.6))
        .await
        .unwrap();
    drop(first);

    let mut second = App::from_config(&config).unwrap();
    second.users.login("lerato@example.com", "summit42").await;
    assert!(second.users.state().login_success);
    second.sync_session().await;
    assert_eq!(names(&second), ["Golden Gate"]);
}

#[test]
fn bad_week_start_is_rejected() {
    let mut config = GeoQuestConfig::default();
    config.logbook.week_start = "someday".into();
    assert!(App::with_store(MemoryStore::new(), &config).is_err());
}
