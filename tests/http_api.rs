use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use chrono::{FixedOffset, TimeDelta, TimeZone};
use serde_json::{json, Value};
use tower::ServiceExt;
use worksync_lib::{clock::ManualClock, db::Database, http, AppState};

struct TestApp {
    _dir: tempfile::TempDir,
    clock: Arc<ManualClock>,
    router: Router,
}

fn app() -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::new(dir.path().join("worksync.sqlite3")).unwrap();
    let clock = Arc::new(ManualClock::new(
        FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2024, 9, 2, 10, 0, 0)
            .unwrap(),
    ));
    let router = http::router(AppState::new(db, clock.clone()));
    TestApp {
        _dir: dir,
        clock,
        router,
    }
}

impl TestApp {
    async fn send(
        &self,
        method: Method,
        uri: &str,
        user: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(user) = user {
            builder = builder.header(http::USER_ID_HEADER, user);
        }
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }
}

#[tokio::test]
async fn requests_without_user_are_unauthorized() {
    let app = app();
    let (status, body) = app
        .send(Method::GET, "/api/wellness/settings", None, None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["status"], "fail");

    let (status, _) = app
        .send(Method::GET, "/api/notifications", Some("   "), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn settings_are_created_with_defaults() {
    let app = app();
    let (status, body) = app
        .send(Method::GET, "/api/wellness/settings", Some("u1"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");

    let settings = &body["data"]["settings"];
    assert_eq!(settings["userId"], "u1");
    assert_eq!(settings["waterReminder"]["intervalMinutes"], 120);
    assert_eq!(settings["eyeBreakReminder"]["intervalMinutes"], 20);
    assert_eq!(settings["postureReminder"]["intervalMinutes"], 45);
    assert_eq!(settings["activeHours"]["start"], "00:00");
    assert_eq!(settings["activeHours"]["end"], "24:00");
    assert!(settings["pauseUntil"].is_null());
}

#[tokio::test]
async fn check_fires_once_then_waits_for_interval() {
    let app = app();
    let (status, body) = app
        .send(Method::GET, "/api/wellness/check-notifications", Some("u1"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let data = &body["data"];
    assert_eq!(data["paused"], false);
    assert_eq!(data["outsideActiveHours"], false);
    let notifications = data["notifications"].as_array().unwrap();
    assert_eq!(notifications.len(), 3);
    assert!(notifications
        .iter()
        .all(|n| n["category"] == "wellness" && n["type"] == "info"));

    app.clock.advance(TimeDelta::minutes(5));
    let (_, body) = app
        .send(Method::GET, "/api/wellness/check-notifications", Some("u1"), None)
        .await;
    assert!(body["data"]["notifications"].as_array().unwrap().is_empty());

    app.clock.advance(TimeDelta::minutes(16));
    let (_, body) = app
        .send(Method::GET, "/api/wellness/check-notifications", Some("u1"), None)
        .await;
    let notifications = body["data"]["notifications"].as_array().unwrap();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0]["title"], "20-20-20 Eye Break");

    let (_, body) = app
        .send(Method::GET, "/api/notifications/stats", Some("u1"), None)
        .await;
    assert_eq!(body["data"], json!({"total": 4, "unread": 4, "read": 0}));
}

#[tokio::test]
async fn pause_and_resume() {
    let app = app();
    let (status, body) = app
        .send(Method::POST, "/api/wellness/pause", Some("u1"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["data"]["message"],
        "Wellness notifications paused for 1 hour(s)"
    );
    assert!(body.get("message").is_none());
    assert!(body["data"]["settings"]["pauseUntil"].is_string());

    let (_, body) = app
        .send(Method::GET, "/api/wellness/check-notifications", Some("u1"), None)
        .await;
    assert_eq!(body["data"]["paused"], true);
    assert!(body["data"]["pauseUntil"].is_string());
    assert!(body["data"]["notifications"].as_array().unwrap().is_empty());

    let (_, body) = app
        .send(
            Method::POST,
            "/api/wellness/pause",
            Some("u1"),
            Some(json!({"duration": 2.5})),
        )
        .await;
    assert_eq!(
        body["data"]["message"],
        "Wellness notifications paused for 2.5 hour(s)"
    );

    let (status, body) = app
        .send(Method::POST, "/api/wellness/resume", Some("u1"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["message"], "Wellness notifications resumed");
    assert!(body["data"]["settings"]["pauseUntil"].is_null());

    let (_, body) = app
        .send(Method::GET, "/api/wellness/check-notifications", Some("u1"), None)
        .await;
    assert_eq!(body["data"]["notifications"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn invalid_pause_duration_is_a_client_error() {
    let app = app();
    for duration in [json!(0), json!(-1), json!(721)] {
        let (status, body) = app
            .send(
                Method::POST,
                "/api/wellness/pause",
                Some("u1"),
                Some(json!({ "duration": duration })),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "duration {duration}");
        assert_eq!(body["status"], "fail");
    }
}

#[tokio::test]
async fn settings_updates_are_validated() {
    let app = app();
    let (status, body) = app
        .send(
            Method::PATCH,
            "/api/wellness/settings",
            Some("u1"),
            Some(json!({"eyeBreakReminder": {"intervalMinutes": 61}})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "fail");

    let (status, _) = app
        .send(
            Method::PATCH,
            "/api/wellness/settings",
            Some("u1"),
            Some(json!({"eyeBreakReminder": {"intervalMinutes": 4}})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    for minutes in [5, 60] {
        let (status, body) = app
            .send(
                Method::PATCH,
                "/api/wellness/settings",
                Some("u1"),
                Some(json!({"eyeBreakReminder": {"intervalMinutes": minutes}})),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "interval {minutes}");
        assert_eq!(
            body["data"]["settings"]["eyeBreakReminder"]["intervalMinutes"],
            minutes
        );
    }

    let (status, _) = app
        .send(
            Method::PATCH,
            "/api/wellness/settings",
            Some("u1"),
            Some(json!({"activeHours": {"start": "25:00"}})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .send(
            Method::PATCH,
            "/api/wellness/settings",
            Some("u1"),
            Some(json!({"unknownField": true})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .send(
            Method::PATCH,
            "/api/wellness/settings",
            Some("u1"),
            Some(json!({
                "waterReminder": {"enabled": false},
                "postureReminder": {"intervalMinutes": 30},
                "activeHours": {"start": "22:00", "end": "06:00"}
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let settings = &body["data"]["settings"];
    assert_eq!(settings["waterReminder"]["enabled"], false);
    assert_eq!(settings["waterReminder"]["intervalMinutes"], 120);
    assert_eq!(settings["postureReminder"]["intervalMinutes"], 30);
    assert_eq!(settings["activeHours"]["start"], "22:00");

    // 10:00 falls outside the overnight window.
    let (_, body) = app
        .send(Method::GET, "/api/wellness/check-notifications", Some("u1"), None)
        .await;
    assert_eq!(body["data"]["outsideActiveHours"], true);
    assert!(body["data"]["notifications"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn reset_timers_refires_reminders() {
    let app = app();
    app.send(Method::GET, "/api/wellness/check-notifications", Some("u1"), None)
        .await;

    let (status, body) = app
        .send(Method::POST, "/api/wellness/reset-timers", Some("u1"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "All notification timers have been reset");
    assert!(body["data"]["settings"]["waterReminder"]["lastNotifiedAt"].is_null());

    let (_, body) = app
        .send(Method::GET, "/api/wellness/check-notifications", Some("u1"), None)
        .await;
    assert_eq!(body["data"]["notifications"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn notifications_lifecycle() {
    let app = app();
    let (status, body) = app
        .send(
            Method::POST,
            "/api/notifications",
            Some("owner"),
            Some(json!({"title": " Deploy ", "message": "Release is out", "type": "success", "category": "project"})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let created = body["data"]["notification"].clone();
    assert_eq!(created["title"], "Deploy");
    assert_eq!(created["read"], false);
    let id = created["id"].as_str().unwrap().to_string();

    let (status, _) = app
        .send(
            Method::POST,
            "/api/notifications",
            Some("owner"),
            Some(json!({"title": "  ", "message": "x"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = app
        .send(Method::GET, "/api/notifications?category=project", Some("owner"), None)
        .await;
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["notifications"][0]["id"], id.as_str());

    let uri = format!("/api/notifications/{id}");
    let (status, body) = app.send(Method::PATCH, &uri, Some("intruder"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Notification not found");

    let (status, body) = app.send(Method::PATCH, &uri, Some("owner"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["notification"]["read"], true);

    let (_, body) = app
        .send(Method::GET, "/api/notifications?read=false", Some("owner"), None)
        .await;
    assert_eq!(body["data"]["total"], 0);

    let (status, _) = app.send(Method::DELETE, &uri, Some("intruder"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app.send(Method::DELETE, &uri, Some("owner"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = app.send(Method::DELETE, &uri, Some("owner"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn mark_all_read_only_touches_own_notifications() {
    let app = app();
    app.send(Method::GET, "/api/wellness/check-notifications", Some("a"), None)
        .await;
    app.send(Method::GET, "/api/wellness/check-notifications", Some("b"), None)
        .await;

    let (status, body) = app
        .send(Method::POST, "/api/notifications/mark-all-read", Some("a"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["updated"], 3);

    let (_, body) = app
        .send(Method::GET, "/api/notifications/stats", Some("b"), None)
        .await;
    assert_eq!(body["data"]["unread"], 3);
}

#[tokio::test]
async fn unknown_routes_use_the_envelope() {
    let app = app();
    let (status, body) = app.send(Method::GET, "/api/nowhere", Some("u1"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["status"], "fail");
    assert_eq!(body["message"], "Can't find /api/nowhere on this server!");
}

#[tokio::test]
async fn tasks_are_sorted_by_due_date_then_priority() {
    let app = app();
    for (title, due, priority) in [
        ("later", "2024-09-10T09:00:00Z", "high"),
        ("soon low", "2024-09-05T09:00:00Z", "low"),
        ("soon high", "2024-09-05T09:00:00Z", "high"),
    ] {
        let (status, body) = app
            .send(
                Method::POST,
                "/api/tasks",
                Some("u1"),
                Some(json!({ "title": title, "dueDate": due, "priority": priority })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["data"]["task"]["status"], "pending");
        assert_eq!(body["data"]["task"]["category"], "personal");
    }

    let (status, body) = app.send(Method::GET, "/api/tasks", Some("u1"), None).await;
    assert_eq!(status, StatusCode::OK);
    let titles: Vec<&str> = body["data"]["tasks"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["soon high", "soon low", "later"]);
    assert_eq!(body["data"]["totalPages"], 1);

    let (_, body) = app
        .send(Method::GET, "/api/tasks?limit=2&page=2", Some("u1"), None)
        .await;
    assert_eq!(body["data"]["results"], 1);
    assert_eq!(body["data"]["totalPages"], 2);
    assert_eq!(body["data"]["tasks"][0]["title"], "later");
}

#[tokio::test]
async fn task_updates_are_scoped_to_their_owner() {
    let app = app();
    let (status, body) = app
        .send(Method::POST, "/api/tasks", Some("u1"), Some(json!({ "title": "no date" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "fail");

    let (_, body) = app
        .send(
            Method::POST,
            "/api/tasks",
            Some("u1"),
            Some(json!({ "title": "Pay rent", "dueDate": "2024-09-30T00:00:00Z" })),
        )
        .await;
    let id = body["data"]["task"]["id"].as_str().unwrap().to_string();
    let uri = format!("/api/tasks/{id}");

    app.clock.set(
        FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2024, 9, 3, 8, 30, 0)
            .unwrap(),
    );
    let change = json!({ "status": "completed", "completed": true });
    let (status, body) = app.send(Method::PUT, &uri, Some("u2"), Some(change.clone())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Task not found");

    let (status, body) = app.send(Method::PUT, &uri, Some("u1"), Some(change)).await;
    assert_eq!(status, StatusCode::OK);
    let task = &body["data"]["task"];
    assert_eq!(task["status"], "completed");
    assert_eq!(task["completed"], true);
    assert_eq!(task["createdAt"], "2024-09-02T10:00:00Z");
    assert_eq!(task["updatedAt"], "2024-09-03T08:30:00Z");

    let (status, _) = app
        .send(Method::PUT, &uri, Some("u1"), Some(json!({ "status": "done" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.send(Method::DELETE, &uri, Some("u2"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app.send(Method::DELETE, &uri, Some("u1"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (_, body) = app.send(Method::GET, "/api/tasks", Some("u1"), None).await;
    assert_eq!(body["data"]["total"], 0);
}

#[tokio::test]
async fn todos_toggle_and_report_stats() {
    let app = app();
    let (status, _) = app.send(Method::GET, "/api/todos", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let mut ids = Vec::new();
    for i in 0..11 {
        let (status, body) = app
            .send(
                Method::POST,
                "/api/todos",
                Some("u1"),
                Some(json!({ "title": format!("todo {i}"), "category": "work" })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        ids.push(body["data"]["todo"]["id"].as_str().unwrap().to_string());
        app.clock.advance(TimeDelta::minutes(1));
    }

    let (_, body) = app.send(Method::GET, "/api/todos", Some("u1"), None).await;
    assert_eq!(body["data"]["results"], 10);
    assert_eq!(body["data"]["total"], 11);
    assert_eq!(body["data"]["totalPages"], 2);
    assert_eq!(body["data"]["todos"][0]["title"], "todo 10");

    let toggle = format!("/api/todos/{}/toggle", ids[0]);
    let (status, body) = app.send(Method::PATCH, &toggle, Some("u1"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["todo"]["completed"], true);
    assert_eq!(body["data"]["todo"]["status"], "completed");

    let (status, _) = app.send(Method::PATCH, &toggle, Some("u2"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = app.send(Method::GET, "/api/todos/stats", Some("u1"), None).await;
    assert_eq!(body["data"], json!({ "total": 11, "completed": 1, "pending": 10 }));

    let (_, body) = app
        .send(Method::GET, "/api/todos?status=completed", Some("u1"), None)
        .await;
    assert_eq!(body["data"]["total"], 1);

    let item = format!("/api/todos/{}", ids[1]);
    let (status, body) = app.send(Method::GET, &item, Some("u1"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["todo"]["title"], "todo 1");
    let (status, _) = app.send(Method::DELETE, &item, Some("u1"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, body) = app.send(Method::GET, &item, Some("u1"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Todo not found");
}

#[tokio::test]
async fn upcoming_reminders_follow_the_clock() {
    let app = app();
    for (message, due) in [
        ("dentist", Some("2024-09-04T09:00:00Z")),
        ("renew passport", Some("2024-09-20T09:00:00Z")),
        ("stretch", None),
    ] {
        let mut body = json!({ "message": message, "intervalMinutes": 60 });
        if let Some(due) = due {
            body["dueDate"] = json!(due);
        }
        let (status, body) = app
            .send(Method::POST, "/api/reminders", Some("u1"), Some(body))
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["message"], "Reminder created successfully");
        assert_eq!(body["data"]["reminder"]["lastSent"], "2024-09-02T10:00:00Z");
    }

    let (status, body) = app
        .send(
            Method::POST,
            "/api/reminders",
            Some("u1"),
            Some(json!({ "message": "x", "intervalMinutes": 0 })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "fail");

    let messages = |body: &Value| -> Vec<String> {
        body["data"]["reminders"]
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["message"].as_str().unwrap().to_string())
            .collect()
    };

    let (_, body) = app.send(Method::GET, "/api/reminders", Some("u1"), None).await;
    assert_eq!(messages(&body), vec!["dentist", "renew passport", "stretch"]);
    let (_, body) = app
        .send(Method::GET, "/api/reminders?upcoming=true", Some("u1"), None)
        .await;
    assert_eq!(messages(&body), vec!["dentist"]);

    app.clock.set(
        FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2024, 9, 16, 10, 0, 0)
            .unwrap(),
    );
    let (_, body) = app
        .send(Method::GET, "/api/reminders?upcoming=true", Some("u1"), None)
        .await;
    assert_eq!(messages(&body), vec!["renew passport"]);

    let (_, body) = app.send(Method::GET, "/api/reminders", Some("u2"), None).await;
    assert!(messages(&body).is_empty());
}

#[tokio::test]
async fn reminder_deletes_need_the_owner() {
    let app = app();
    let (_, body) = app
        .send(
            Method::POST,
            "/api/reminders",
            Some("u1"),
            Some(json!({ "message": "drink water", "intervalMinutes": 30 })),
        )
        .await;
    let uri = format!("/api/reminders/{}", body["data"]["reminder"]["id"].as_str().unwrap());

    let (status, body) = app.send(Method::DELETE, &uri, Some("u2"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Reminder not found");
    let (status, _) = app.send(Method::DELETE, &uri, Some("u1"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = app.send(Method::DELETE, &uri, Some("u1"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
