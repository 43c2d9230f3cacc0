use std::sync::Arc;

use wiki_store::{AppError, Collection, DocumentStore, Filter, SqliteStore, User, WikiService};

async fn service() -> (Arc<SqliteStore>, WikiService) {
    wiki_store::init_tracing();
    let store = Arc::new(SqliteStore::new_in_memory().await.unwrap());
    (store.clone(), WikiService::new(store))
}

async fn user_count(store: &SqliteStore) -> usize {
    store
        .find_many(Collection::Users, &Filter::All)
        .await
        .unwrap()
        .len()
}

#[tokio::test]
async fn name_and_email_are_required() {
    let (store, service) = service().await;

    let mut user = User::default();
    user.set_email("nameless@example.com");
    let err = service.save_user(&mut user).await.unwrap_err();
    assert!(matches!(err, AppError::MissingField { field: "name", .. }));

    let mut user = User::default();
    user.set_name("Emailless");
    let err = service.save_user(&mut user).await.unwrap_err();
    assert!(matches!(err, AppError::MissingField { field: "email", .. }));

    assert_eq!(user_count(&store).await, 0);
}

#[tokio::test]
async fn email_must_be_unique() {
    let (store, service) = service().await;

    let mut first = User::new("Ada", "ada@example.com");
    service.save_user(&mut first).await.unwrap();

    let mut second = User::new("Imposter", "ada@example.com");
    let err = service.save_user(&mut second).await.unwrap_err();
    assert!(matches!(err, AppError::UniquenessViolation(_)));
    assert!(second.id().is_none());
    assert_eq!(user_count(&store).await, 1);
}

#[tokio::test]
async fn email_uniqueness_is_case_sensitive() {
    let (store, service) = service().await;

    let mut lower = User::new("Ada", "ada@example.com");
    let mut upper = User::new("Ada", "ADA@example.com");
    service.save_user(&mut lower).await.unwrap();
    service.save_user(&mut upper).await.unwrap();

    assert_eq!(user_count(&store).await, 2);
}

#[tokio::test]
async fn updating_to_a_taken_email_is_rejected() {
    let (_, service) = service().await;

    let mut ada = User::new("Ada", "ada@example.com");
    let mut bob = User::new("Bob", "bob@example.com");
    service.save_user(&mut ada).await.unwrap();
    service.save_user(&mut bob).await.unwrap();

    bob.set_email("ada@example.com");
    let err = service.save_user(&mut bob).await.unwrap_err();
    assert!(matches!(err, AppError::UniquenessViolation(_)));

    // The stored row kept its old email.
    let reloaded = service.find_user(bob.id().unwrap()).await.unwrap().unwrap();
    assert_eq!(reloaded.email(), Some("bob@example.com"));
}

#[tokio::test]
async fn find_or_create_is_idempotent_per_email() {
    let (store, service) = service().await;

    let first = service
        .find_or_create_user("Ada", "ada@example.com")
        .await
        .unwrap();
    let second = service
        .find_or_create_user("Ada", "ada@example.com")
        .await
        .unwrap();

    assert_eq!(first.id(), second.id());
    assert_eq!(user_count(&store).await, 1);
}

#[tokio::test]
async fn find_or_create_returns_the_matching_user() {
    let (_, service) = service().await;

    let ada = service
        .find_or_create_user("Ada", "ada@example.com")
        .await
        .unwrap();
    let bob = service
        .find_or_create_user("Bob", "bob@example.com")
        .await
        .unwrap();
    assert_ne!(ada.id(), bob.id());

    let found = service
        .find_or_create_user("Someone Else", "bob@example.com")
        .await
        .unwrap();
    assert_eq!(found.id(), bob.id());
    assert_eq!(found.name(), Some("Bob"));
}

#[tokio::test]
async fn find_or_create_validates_the_created_user() {
    let (store, service) = service().await;

    let err = service
        .find_or_create_user("", "blank@example.com")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::MissingField { field: "name", .. }));
    assert_eq!(user_count(&store).await, 0);
}

#[tokio::test]
async fn lookup_by_email_is_exact_match() {
    let (_, service) = service().await;

    let mut ada = User::new("Ada", "ada@example.com");
    service.save_user(&mut ada).await.unwrap();

    let found = service
        .find_user_by_email("ada@example.com")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.id(), ada.id());
    assert!(service
        .find_user_by_email("ADA@example.com")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn removed_user_frees_the_email() {
    let (store, service) = service().await;

    let mut ada = User::new("Ada", "ada@example.com");
    service.save_user(&mut ada).await.unwrap();
    assert_eq!(service.remove_user(&ada).await.unwrap(), 1);
    assert_eq!(user_count(&store).await, 0);

    let mut again = User::new("Ada", "ada@example.com");
    service.save_user(&mut again).await.unwrap();
    assert_eq!(user_count(&store).await, 1);

    let unsaved = User::new("Ghost", "ghost@example.com");
    assert_eq!(service.remove_user(&unsaved).await.unwrap(), 0);
}
