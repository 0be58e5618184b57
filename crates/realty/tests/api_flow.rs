mod common;

use std::sync::atomic::Ordering;
use std::time::Duration;

use axum::http::StatusCode;
use common::{
    form_request, get_request, json_request, multipart_body, multipart_body_for,
    multipart_request, multipart_request_with, property_json, read_json, TestApp, ADMIN,
};
use serde_json::json;

#[tokio::test]
async fn inquiry_is_created_even_when_both_channels_fail() {
    let app = TestApp::with_broken_channels(Duration::from_secs(5));

    let response = tokio::time::timeout(
        Duration::from_secs(2),
        app.send(json_request(
            "POST",
            "/api/inquiries/",
            None,
            json!({
                "name": "Asha",
                "phone": "9876543210",
                "email": "asha@example.com",
                "message": "Looking for a 2BHK",
            }),
        )),
    )
    .await
    .expect("response is not held up by notification delivery");

    assert_eq!(response.status(), StatusCode::CREATED);
    let created = read_json(response).await;
    assert_eq!(created["name"], "Asha");
    assert!(created["id"].as_u64().is_some());
    assert!(created["created_at"].as_str().is_some());

    let stored = app.context.inquiries.list().expect("list inquiries");
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].email.as_deref(), Some("asha@example.com"));

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(app.attempts.load(Ordering::SeqCst), 2, "email and whatsapp both attempted");
}

#[tokio::test]
async fn invalid_inquiry_returns_field_errors() {
    let app = TestApp::new();
    let response = app
        .send(json_request(
            "POST",
            "/api/inquiries/",
            None,
            json!({ "phone": "9876543210", "email": "not-an-email" }),
        ))
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let errors = read_json(response).await;
    assert!(errors["name"].is_array());
    assert!(errors["email"].is_array());
    assert!(app.context.inquiries.list().expect("list").is_empty());
}

#[tokio::test]
async fn inquiry_can_be_posted_as_a_form() {
    let app = TestApp::new();

    let response = app
        .send(form_request(
            "/api/inquiries/",
            None,
            "name=Ravi&phone=9988776655&email=ravi%40example.com&message=Two+bedrooms",
        ))
        .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let created = read_json(response).await;
    assert_eq!(created["email"], "ravi@example.com");
    assert_eq!(created["message"], "Two bedrooms");

    let response = app
        .send(form_request("/api/inquiries/", None, "phone=9988776655"))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(read_json(response).await["name"].is_array());
    assert_eq!(app.context.inquiries.list().expect("list").len(), 1);
}

#[tokio::test]
async fn admin_can_edit_inquiries() {
    let app = TestApp::new();
    let token = app.access_token().await;
    let created = read_json(
        app.send(json_request(
            "POST",
            "/api/inquiries/",
            None,
            json!({ "name": "Asha", "phone": "9876543210", "location": "Pune" }),
        ))
        .await,
    )
    .await;
    let path = format!("/api/inquiries/{}/", created["id"]);

    let response = app
        .send(json_request(
            "PATCH",
            &path,
            None,
            json!({ "message": "Call after 6pm" }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .send(json_request(
            "PATCH",
            &path,
            Some(&token),
            json!({ "message": "Call after 6pm" }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let patched = read_json(response).await;
    assert_eq!(patched["message"], "Call after 6pm");
    assert_eq!(patched["location"], "Pune");
    assert_eq!(patched["created_at"], created["created_at"]);

    let response = app
        .send(json_request(
            "PUT",
            &path,
            Some(&token),
            json!({ "name": "Asha Rao" }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(read_json(response).await["phone"].is_array());

    let response = app
        .send(json_request(
            "PUT",
            &path,
            Some(&token),
            json!({ "name": "Asha Rao", "phone": "9876543210" }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let replaced = read_json(response).await;
    assert_eq!(replaced["name"], "Asha Rao");
    assert_eq!(replaced["location"], serde_json::Value::Null);

    let response = app
        .send(json_request(
            "PATCH",
            "/api/inquiries/999/",
            Some(&token),
            json!({ "message": "x" }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn admin_can_move_and_replace_images() {
    let app = TestApp::new();
    let token = app.access_token().await;
    let mut ids = Vec::new();
    for title in ["Sea View", "Hill Crest"] {
        let response = app
            .send(json_request(
                "POST",
                "/api/properties/",
                Some(&token),
                property_json(title, "Bandra", "25000000"),
            ))
            .await;
        ids.push(read_json(response).await["id"].as_u64().expect("property id"));
    }
    let first = ids[0].to_string();
    let second = ids[1].to_string();

    let body = multipart_body(&[("property", first.as_str())], &[("front.jpg", "jpeg-bytes")]);
    let uploaded = read_json(
        app.send(multipart_request("/api/property-images/", Some(&token), body))
            .await,
    )
    .await;
    let image_path = format!("/api/property-images/{}/", uploaded[0]["id"]);

    let body = multipart_body_for("image", &[("property", second.as_str())], &[]);
    let response = app
        .send(multipart_request_with("PATCH", &image_path, Some(&token), body))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let moved = read_json(response).await;
    assert_eq!(moved["property"], ids[1]);
    assert_eq!(moved["image"], uploaded[0]["image"]);

    let body = multipart_body_for("image", &[("property", second.as_str())], &[]);
    let response = app
        .send(multipart_request_with("PUT", &image_path, Some(&token), body))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(read_json(response).await["image"].is_array());

    let body = multipart_body_for(
        "image",
        &[("property", first.as_str())],
        &[("hall.png", "png-bytes")],
    );
    let response = app
        .send(multipart_request_with("PUT", &image_path, Some(&token), body))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let replaced = read_json(response).await;
    assert_eq!(replaced["property"], ids[0]);
    assert!(replaced["image"]
        .as_str()
        .expect("image url")
        .ends_with(".png"));

    let body = multipart_body_for("image", &[("property", second.as_str())], &[]);
    let response = app
        .send(multipart_request_with("PATCH", &image_path, None, body))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn admin_endpoints_reject_anonymous_callers() {
    let app = TestApp::new();

    let response = app
        .send(json_request(
            "POST",
            "/api/properties/",
            None,
            property_json("Sea View", "Bandra", "25000000"),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = read_json(response).await;
    assert_eq!(body["detail"], "Authentication credentials were not provided.");
    assert!(app.context.listings.list().expect("list").is_empty());

    let response = app
        .send(json_request(
            "GET",
            "/api/inquiries/",
            Some("not-a-token"),
            json!({}),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn token_pair_is_issued_and_refreshed() {
    let app = TestApp::new();

    let response = app
        .send(json_request(
            "POST",
            "/api/token/",
            None,
            json!({ "username": ADMIN, "password": "wrong" }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = read_json(response).await;
    assert_eq!(
        body["detail"],
        "No active account found with the given credentials"
    );

    let response = app
        .send(json_request(
            "POST",
            "/api/token/",
            None,
            json!({ "username": ADMIN, "password": common::PASSWORD }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let pair = read_json(response).await;
    let refresh = pair["refresh"].as_str().expect("refresh token");

    let response = app
        .send(json_request(
            "POST",
            "/api/token/refresh/",
            None,
            json!({ "refresh": refresh }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let refreshed = read_json(response).await;
    let access = refreshed["access"].as_str().expect("new access token");

    let response = app
        .send(json_request("GET", "/api/inquiries/", Some(access), json!({})))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    // An access token is not accepted where a refresh token is expected.
    let access = pair["access"].as_str().expect("access token");
    let response = app
        .send(json_request(
            "POST",
            "/api/token/refresh/",
            None,
            json!({ "refresh": access }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn property_crud_and_sold_toggle() {
    let app = TestApp::new();
    let token = app.access_token().await;

    let response = app
        .send(json_request(
            "POST",
            "/api/properties/",
            Some(&token),
            property_json("Sea View", "Bandra", "25000000"),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = read_json(response).await;
    let id = created["id"].as_u64().expect("property id");
    assert_eq!(created["price"], "25000000.00");
    assert_eq!(created["sold_out"], false);
    assert_eq!(created["images"], json!([]));

    let response = app
        .send(json_request(
            "PATCH",
            &format!("/api/properties/{id}/"),
            Some(&token),
            json!({ "price": "24500000.50" }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let patched = read_json(response).await;
    assert_eq!(patched["price"], "24500000.50");
    assert_eq!(patched["title"], "Sea View");

    let toggle = format!("/api/properties/{id}/toggle_sold/");
    let response = app
        .send(json_request("POST", &toggle, Some(&token), json!({})))
        .await;
    assert_eq!(read_json(response).await, json!({ "sold_out": true }));
    let response = app
        .send(json_request("POST", &toggle, Some(&token), json!({})))
        .await;
    assert_eq!(read_json(response).await, json!({ "sold_out": false }));

    let response = app
        .send(get_request("/api/properties/999/", None))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn deleting_a_property_removes_its_images() {
    let app = TestApp::new();
    let token = app.access_token().await;

    let response = app
        .send(json_request(
            "POST",
            "/api/properties/",
            Some(&token),
            property_json("Sea View", "Bandra", "25000000"),
        ))
        .await;
    let id = read_json(response).await["id"].as_u64().expect("property id");

    let property = id.to_string();
    let body = multipart_body(
        &[("property", property.as_str())],
        &[("front.jpg", "jpeg-bytes"), ("hall.png", "png-bytes")],
    );
    let response = app
        .send(multipart_request("/api/property-images/", Some(&token), body))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let images = read_json(response).await;
    let images = images.as_array().expect("created images");
    assert_eq!(images.len(), 2);
    assert!(images[0]["image"]
        .as_str()
        .expect("image url")
        .starts_with("/media/properties/"));

    let response = app
        .send(json_request(
            "DELETE",
            &format!("/api/properties/{id}/"),
            Some(&token),
            json!({}),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app.send(get_request("/api/property-images/", None)).await;
    assert_eq!(read_json(response).await, json!([]));
    let response = app
        .send(get_request(&format!("/api/properties/{id}/"), None))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn image_upload_requires_property_and_files() {
    let app = TestApp::new();
    let token = app.access_token().await;

    let body = multipart_body(&[], &[("front.jpg", "jpeg-bytes")]);
    let response = app
        .send(multipart_request("/api/property-images/", Some(&token), body))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        read_json(response).await,
        json!({ "error": "property is required" })
    );

    let body = multipart_body(&[("property", "1")], &[]);
    let response = app
        .send(multipart_request("/api/property-images/", Some(&token), body))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        read_json(response).await,
        json!({ "error": "No images provided" })
    );

    let body = multipart_body(&[("property", "42")], &[("front.jpg", "jpeg-bytes")]);
    let response = app
        .send(multipart_request("/api/property-images/", Some(&token), body))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let errors = read_json(response).await;
    assert_eq!(
        errors["property"],
        json!(["Invalid pk \"42\" - object does not exist."])
    );
}
