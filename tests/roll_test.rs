//! End-to-end tests for the roll endpoints

mod common;

use common::DungeonTest;
use dungeonbot::Config;
use serde_json::{json, Value};

fn faces(result: &Value, term: usize) -> Vec<i64> {
    result["breakdown"][term]["faces"]
        .as_array()
        .expect("faces array")
        .iter()
        .map(|f| f.as_i64().unwrap())
        .collect()
}

#[tokio::test]
async fn test_help_text() {
    let bot = DungeonTest::start().await.expect("Failed to start server");

    let resp = bot.get("/roll").await.unwrap();
    assert_eq!(resp.status(), 200);
    assert!(resp.text().await.unwrap().contains("/roll/savedroll"));
}

#[tokio::test]
async fn test_single_roll() {
    let bot = DungeonTest::start().await.expect("Failed to start server");

    let resp = bot.get("/roll/3d6+2").await.unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();

    assert_eq!(body["expression"], "3d6+2");
    let dice = faces(&body, 0);
    assert_eq!(dice.len(), 3);
    assert!(dice.iter().all(|&f| (1..=6).contains(&f)));
    assert_eq!(body["breakdown"][1]["value"], 2);
    assert_eq!(body["total"], dice.iter().sum::<i64>() + 2);
}

#[tokio::test]
async fn test_single_roll_url_encoded() {
    let bot = DungeonTest::start().await.expect("Failed to start server");

    let resp = bot.get("/roll/1d20%20-%201").await.unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["expression"], "1d20-1");
}

#[tokio::test]
async fn test_single_roll_parse_error() {
    let bot = DungeonTest::start().await.expect("Failed to start server");

    let resp = bot.get("/roll/3d1").await.unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "invalid_sides");
    assert_eq!(body["position"], 2);
    assert_eq!(body["fragment"], "1");
}

#[tokio::test]
async fn test_seeded_server_is_deterministic() {
    let a = DungeonTest::start().await.expect("Failed to start server");
    let b = DungeonTest::start().await.expect("Failed to start server");

    let ra: Value = a.get("/roll/10d20").await.unwrap().json().await.unwrap();
    let rb: Value = b.get("/roll/10d20").await.unwrap().json().await.unwrap();
    assert_eq!(ra, rb);
}

#[tokio::test]
async fn test_batch_partial_failure() {
    let bot = DungeonTest::start().await.expect("Failed to start server");

    let resp = bot
        .post("/roll", &json!({ "rolls": ["1d4", "bogus", {"expression": "1d6"}] }))
        .await
        .unwrap();
    assert_eq!(resp.status(), 202);
    let body: Value = resp.json().await.unwrap();
    let results = body["results"].as_array().unwrap();

    assert_eq!(results.len(), 3);
    assert_eq!(results[0]["request"], json!({"expression": "1d4"}));
    assert!(results[0]["result"]["total"].is_i64());
    assert!(results[0].get("error").is_none());

    assert_eq!(results[1]["request"], json!({"expression": "bogus"}));
    assert_eq!(results[1]["error"]["error"], "malformed_term");
    assert!(results[1].get("result").is_none());

    assert_eq!(results[2]["request"], json!({"expression": "1d6"}));
    let total = results[2]["result"]["total"].as_i64().unwrap();
    assert!((1..=6).contains(&total));
}

#[tokio::test]
async fn test_batch_item_with_wrong_shape() {
    let bot = DungeonTest::start().await.expect("Failed to start server");

    let resp = bot
        .post("/roll", &json!({ "rolls": ["1d4", 5, "1d6"] }))
        .await
        .unwrap();
    assert_eq!(resp.status(), 202);
    let body: Value = resp.json().await.unwrap();
    let results = body["results"].as_array().unwrap();

    assert_eq!(results.len(), 3);
    assert!((1..=4).contains(&results[0]["result"]["total"].as_i64().unwrap()));

    assert_eq!(results[1]["request"], json!(5));
    assert_eq!(results[1]["error"]["error"], "invalid_request");
    assert!(results[1].get("result").is_none());

    assert!((1..=6).contains(&results[2]["result"]["total"].as_i64().unwrap()));
}

#[tokio::test]
async fn test_batch_body_wrong_shape() {
    let bot = DungeonTest::start().await.expect("Failed to start server");

    let resp = bot.post("/roll", &json!({ "rolls": 5 })).await.unwrap();
    assert_eq!(resp.status(), 422);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "invalid_request");
}

#[tokio::test]
async fn test_batch_size_limit() {
    let bot = DungeonTest::start().await.expect("Failed to start server");

    let rolls = vec!["1d6"; dungeonbot::dice::MAX_BATCH_SIZE];
    let resp = bot.post("/roll", &json!({ "rolls": rolls })).await.unwrap();
    assert_eq!(resp.status(), 202);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["results"].as_array().unwrap().len(), 50);

    let rolls = vec!["1d6"; dungeonbot::dice::MAX_BATCH_SIZE + 1];
    let resp = bot.post("/roll", &json!({ "rolls": rolls })).await.unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "batch_too_large");
}

#[tokio::test]
async fn test_expression_dice_limit() {
    let bot = DungeonTest::start().await.expect("Failed to start server");

    let resp = bot.get("/roll/1000d6+1000d6").await.unwrap();
    assert_eq!(resp.status(), 200);

    let resp = bot.get("/roll/1000d6+1000d6+1d4").await.unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "too_many_dice");
    assert_eq!(body["position"], 14);
    assert_eq!(body["fragment"], "1d4");
}

#[tokio::test]
async fn test_save_body_wrong_shape() {
    let bot = DungeonTest::start().await.expect("Failed to start server");

    let resp = bot
        .put("/roll/savedroll/axe", &json!({ "formula": "1d12" }))
        .await
        .unwrap();
    assert_eq!(resp.status(), 422);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "invalid_request");
}

#[tokio::test]
async fn test_batch_with_saved_rolls() {
    let mut config = Config {
        rng_seed: Some(7),
        ..Config::default()
    };
    config
        .saved_rolls
        .insert("fireball".to_string(), "8d6".to_string());
    let bot = DungeonTest::start_with(config).await.expect("Failed to start server");

    let resp = bot
        .post(
            "/roll",
            &json!({ "rolls": [{"saved_roll": "fireball"}, {"saved_roll": "missing"}] }),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), 202);
    let body: Value = resp.json().await.unwrap();
    let results = body["results"].as_array().unwrap();

    assert_eq!(faces(&results[0]["result"], 0).len(), 8);
    assert_eq!(results[1]["error"]["error"], "not_found");
}

#[tokio::test]
async fn test_save_and_roll_saved() {
    let bot = DungeonTest::start().await.expect("Failed to start server");

    let resp = bot
        .put("/roll/savedroll/longsword", &json!({ "expression": "1d8 + 3" }))
        .await
        .unwrap();
    assert_eq!(resp.status(), 202);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["name"], "longsword");
    assert_eq!(body["expression"], "1d8 + 3");
    assert_eq!(body["canonical"], "1d8+3");
    assert_eq!(body["min"], 4);
    assert_eq!(body["max"], 11);

    let resp = bot.get("/roll/savedroll/longsword").await.unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["expression"], "1d8+3");
    let total = body["total"].as_i64().unwrap();
    assert!((4..=11).contains(&total));
}

#[tokio::test]
async fn test_saved_roll_errors() {
    let bot = DungeonTest::start().await.expect("Failed to start server");

    let resp = bot.get("/roll/savedroll/missing").await.unwrap();
    assert_eq!(resp.status(), 404);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "not_found");

    let resp = bot
        .put("/roll/savedroll/broken", &json!({ "expression": "0d6" }))
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "invalid_expression");
    assert_eq!(body["position"], 0);
}

#[tokio::test]
async fn test_list_saved_rolls() {
    let bot = DungeonTest::start().await.expect("Failed to start server");

    bot.put("/roll/savedroll/zap", &json!({ "expression": "1d10" }))
        .await
        .unwrap();
    bot.put("/roll/savedroll/axe", &json!({ "expression": "1d12" }))
        .await
        .unwrap();

    let body: Value = bot.get("/roll/savedroll").await.unwrap().json().await.unwrap();
    let names: Vec<&str> = body["saved_rolls"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["axe", "zap"]);
}
