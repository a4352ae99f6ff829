//! Integration tests for the REST client using wiremock
//!
//! These tests run the client, fetcher, and mutation calls against mocked
//! endpoints, covering success paths, scoped queries, and error statuses.

use serde_json::json;
use std::time::Duration;
use tplace::api::{ApiClient, ApiError, ErrorKind};
use tplace::mutation::{apply_bulk_delete, create_item, delete_item, delete_items, BulkDeletePolicy};
use tplace::resource::{
    fetch_children, fetch_collection, fetch_thumbnail, fetch_user_name, get_resource, Collection,
    Item,
};
use tplace::selection::SelectionSet;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> ApiClient {
    ApiClient::new(&server.uri(), Duration::from_secs(5)).unwrap()
}

mod fetch_tests {
    use super::*;

    #[tokio::test]
    async fn test_fetch_collection_parses_items() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/posts"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": 1, "userId": 1, "title": "first", "body": "a"},
                {"id": 2, "userId": 2, "title": "second", "body": "b"},
                {"title": "no id"}
            ])))
            .mount(&server)
            .await;

        let posts = get_resource("posts").unwrap();
        let items = fetch_collection(&client_for(&server), posts).await.unwrap();

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].id, 1);
        assert_eq!(items[1].text("title"), "second");
    }

    #[tokio::test]
    async fn test_non_array_body_is_decode_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/todos"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 1})))
            .mount(&server)
            .await;

        let todos = get_resource("todos").unwrap();
        let err = fetch_collection(&client_for(&server), todos).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decode);
    }

    #[tokio::test]
    async fn test_server_error_status() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/albums"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let albums = get_resource("albums").unwrap();
        let err = fetch_collection(&client_for(&server), albums).await.unwrap_err();
        assert_eq!(err, ApiError::Status { status: 500 });
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn test_children_are_scoped_to_parent() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/comments"))
            .and(query_param("postId", "7"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": 31, "postId": 7, "name": "n", "email": "e@x", "body": "b"}
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let posts = get_resource("posts").unwrap();
        let sub = posts.sub_resource.as_ref().unwrap();
        let comments = get_resource(&sub.resource_key).unwrap();

        let children = fetch_children(&client_for(&server), sub, comments, 7).await.unwrap();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].id, 31);
    }

    #[tokio::test]
    async fn test_thumbnail_requests_one_photo() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/photos"))
            .and(query_param("albumId", "3"))
            .and(query_param("_limit", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": 101, "albumId": 3, "title": "p", "thumbnailUrl": "https://img/150"}
            ])))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/photos"))
            .and(query_param("albumId", "4"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let albums = get_resource("albums").unwrap();
        let thumb = albums.thumbnail.as_ref().unwrap();
        let photos = get_resource(&thumb.resource_key).unwrap();
        let client = client_for(&server);

        let url = fetch_thumbnail(&client, thumb, photos, 3).await.unwrap();
        assert_eq!(url.as_deref(), Some("https://img/150"));

        let none = fetch_thumbnail(&client, thumb, photos, 4).await.unwrap();
        assert_eq!(none, None);
    }

    #[tokio::test]
    async fn test_fetch_user_name() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/users/1"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"id": 1, "name": "Leanne Graham"})),
            )
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/users/99"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({})))
            .mount(&server)
            .await;

        let users = get_resource("users").unwrap();
        let client = client_for(&server);

        assert_eq!(fetch_user_name(&client, users, 1).await.unwrap(), "Leanne Graham");
        assert_eq!(
            fetch_user_name(&client, users, 99).await.unwrap_err().status(),
            Some(404)
        );
    }

    #[test]
    fn test_timeout_is_network_error() {
        tokio_test::block_on(async {
            let server = MockServer::start().await;

            Mock::given(method("GET"))
                .and(path("/todos"))
                .respond_with(
                    ResponseTemplate::new(200)
                        .set_body_json(json!([]))
                        .set_delay(Duration::from_millis(500)),
                )
                .mount(&server)
                .await;

            let client = ApiClient::new(&server.uri(), Duration::from_millis(50)).unwrap();
            let todos = get_resource("todos").unwrap();
            let err = fetch_collection(&client, todos).await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Network);
        });
    }
}

mod mutation_tests {
    use super::*;

    #[tokio::test]
    async fn test_create_sends_json_and_returns_server_id() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/todos"))
            .and(header("content-type", "application/json; charset=UTF-8"))
            .and(body_json(json!({"title": "buy milk", "completed": false})))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "id": 201, "title": "buy milk", "completed": false
            })))
            .expect(1)
            .mount(&server)
            .await;

        let todos = get_resource("todos").unwrap();
        let body = json!({"title": "buy milk", "completed": false});
        let item = create_item(&client_for(&server), todos, &body).await;

        let item = tokio_test::assert_ok!(item);
        assert_eq!(item.id, 201);
        assert_eq!(item.text("title"), "buy milk");
    }

    #[tokio::test]
    async fn test_create_without_id_is_decode_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/posts"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"title": "x"})))
            .mount(&server)
            .await;

        let posts = get_resource("posts").unwrap();
        let err = create_item(&client_for(&server), posts, &json!({"title": "x"}))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decode);
    }

    #[tokio::test]
    async fn test_delete_success_and_missing() {
        let server = MockServer::start().await;

        Mock::given(method("DELETE"))
            .and(path("/posts/1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&server)
            .await;

        Mock::given(method("DELETE"))
            .and(path("/posts/404"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let posts = get_resource("posts").unwrap();
        let client = client_for(&server);

        assert!(delete_item(&client, posts, 1).await.is_ok());
        assert_eq!(
            delete_item(&client, posts, 404).await.unwrap_err(),
            ApiError::Status { status: 404 }
        );
    }

    fn seeded() -> (Collection, SelectionSet) {
        let items = (1..=4)
            .filter_map(|id| Item::from_value(json!({"id": id, "title": format!("t{id}")}), "id"))
            .collect();
        let collection = Collection::from_items(items);
        let mut selection = SelectionSet::new();
        selection.select_all([1, 2, 3], true);
        (collection, selection)
    }

    async fn bulk_server() -> MockServer {
        let server = MockServer::start().await;
        for id in [1, 3] {
            Mock::given(method("DELETE"))
                .and(path(format!("/posts/{id}")))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
                .mount(&server)
                .await;
        }
        Mock::given(method("DELETE"))
            .and(path("/posts/2"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        server
    }

    #[tokio::test]
    async fn test_bulk_delete_per_item_removes_successes() {
        let server = bulk_server().await;
        let posts = get_resource("posts").unwrap();
        let (mut collection, mut selection) = seeded();

        let results = delete_items(&client_for(&server), posts, &selection.sorted_ids()).await;
        let report = apply_bulk_delete(
            &mut collection,
            &mut selection,
            results,
            BulkDeletePolicy::PerItem,
        );

        assert_eq!(report.removed, vec![1, 3]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, 2);
        assert!(!report.is_success());
        assert_eq!(collection.ids().collect::<Vec<_>>(), vec![2, 4]);
        assert_eq!(selection.sorted_ids(), vec![2]);
    }

    #[tokio::test]
    async fn test_bulk_delete_all_or_nothing_keeps_everything() {
        let server = bulk_server().await;
        let posts = get_resource("posts").unwrap();
        let (mut collection, mut selection) = seeded();

        let results = delete_items(&client_for(&server), posts, &selection.sorted_ids()).await;
        let report = apply_bulk_delete(
            &mut collection,
            &mut selection,
            results,
            BulkDeletePolicy::AllOrNothing,
        );

        assert!(report.removed.is_empty());
        assert_eq!(report.kept, vec![1, 3]);
        assert_eq!(collection.len(), 4);
        assert_eq!(selection.len(), 3);
    }
}
