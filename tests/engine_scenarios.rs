//! End-to-end scenarios exercising the engine's public `handle_call` entry
//! point, covering the eight literal request/response pairs this service's
//! wire contract is defined against plus the null-id rejection case.

use std::sync::Arc;

use rpcd_lib::protocol::jsonrpc::registry::HandlerKind;
use rpcd_lib::protocol::jsonrpc::types::HandlerOptions;
use rpcd_lib::protocol::jsonrpc::{Context, Engine, SubError};
use serde_json::{json, Value};

fn register_subtract(engine: &Engine) {
    engine.registry().register(
        "subtract",
        HandlerKind::Method(Arc::new(|_id, params| {
            let (minuend, subtrahend) = match params {
                Some(Value::Array(items)) => (
                    items[0].as_i64().unwrap(),
                    items[1].as_i64().unwrap(),
                ),
                Some(Value::Object(map)) => (
                    map["minuend"].as_i64().unwrap(),
                    map["subtrahend"].as_i64().unwrap(),
                ),
                _ => panic!("subtract needs params"),
            };
            Ok(json!((minuend - subtrahend).to_string()))
        })),
        None,
        HandlerOptions::default(),
    );
}

#[test]
fn scenario_1_method_with_positional_params() {
    let engine = Engine::new();
    register_subtract(&engine);
    let ctx = Context::new();

    let output = engine
        .handle_call(
            &ctx,
            br#"{"jsonrpc":"2.0","method":"subtract","params":[42,23],"id":"1"}"#,
        )
        .unwrap();

    let value: Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(value["jsonrpc"], "2.0");
    assert_eq!(value["result"], "19");
    assert_eq!(value["id"], "1");
    assert!(value.get("error").is_none());
}

#[test]
fn scenario_2_method_with_named_params() {
    let engine = Engine::new();
    register_subtract(&engine);
    let ctx = Context::new();

    let output = engine
        .handle_call(
            &ctx,
            br#"{"jsonrpc":"2.0","method":"subtract","params":{"minuend":42,"subtrahend":23},"id":"3"}"#,
        )
        .unwrap();

    let value: Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(value["result"], "19");
    assert_eq!(value["id"], "3");
}

#[test]
fn scenario_3_unknown_method() {
    let engine = Engine::new();
    let ctx = Context::new();

    let output = engine
        .handle_call(&ctx, br#"{"jsonrpc":"2.0","method":"foobar","id":"1"}"#)
        .unwrap();

    let value: Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(value["error"]["code"], -32601);
    assert_eq!(value["error"]["message"], "Method not found");
    assert_eq!(value["id"], "1");
}

#[test]
fn scenario_4_malformed_json() {
    let engine = Engine::new();
    let ctx = Context::new();

    let output = engine
        .handle_call(
            &ctx,
            br#"{"jsonrpc":"2.0","method":"foobar, "params":"bar","baz]"#,
        )
        .unwrap();

    let value: Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(value["error"]["code"], -32700);
    assert_eq!(value["error"]["message"], "Parse error");
    assert!(value.get("id").is_none());
}

#[test]
fn scenario_5_empty_array() {
    let engine = Engine::new();
    let ctx = Context::new();

    let output = engine.handle_call(&ctx, b"[]").unwrap();

    let value: Value = serde_json::from_slice(&output).unwrap();
    assert!(value.is_object());
    assert_eq!(value["error"]["code"], -32600);
    assert_eq!(value["error"]["message"], "Invalid Request");
}

#[test]
fn scenario_6_batch_mix_of_method_and_notification() {
    let engine = Engine::new();
    engine.registry().register(
        "m",
        HandlerKind::Method(Arc::new(|_id, params| {
            let flagged_yes = params
                .and_then(|p| p.get("e"))
                .and_then(Value::as_str)
                .map(|e| e == "yes")
                .unwrap_or(false);
            if flagged_yes {
                Err(vec![SubError::new(9999, "msg")])
            } else {
                Ok(json!({"ran": "ok"}))
            }
        })),
        None,
        HandlerOptions::default(),
    );
    engine.registry().register(
        "n",
        HandlerKind::Notification(Arc::new(|_params| {})),
        None,
        HandlerOptions::default(),
    );
    let ctx = Context::new();

    let output = engine
        .handle_call(
            &ctx,
            br#"[{"jsonrpc":"2.0","method":"m","params":{"e":"no"},"id":"13"},{"jsonrpc":"2.0","method":"m","params":{"e":"yes"},"id":"14"},{"jsonrpc":"2.0","method":"n","params":{}}]"#,
        )
        .unwrap();

    let value: Value = serde_json::from_slice(&output).unwrap();
    let elements = value.as_array().unwrap();
    assert_eq!(elements.len(), 2);

    assert_eq!(elements[0]["id"], "13");
    assert_eq!(elements[0]["result"]["ran"], "ok");

    assert_eq!(elements[1]["id"], "14");
    assert_eq!(elements[1]["error"]["code"], 9);
    assert_eq!(elements[1]["error"]["message"], "Error during execution");
    assert_eq!(elements[1]["error"]["data"][0]["code"], 9999);
    assert_eq!(elements[1]["error"]["data"][0]["message"], "msg");
}

#[test]
fn scenario_7_pure_notification_batch_produces_no_output() {
    let engine = Engine::new();
    engine.registry().register(
        "n",
        HandlerKind::Notification(Arc::new(|_params| {})),
        None,
        HandlerOptions::default(),
    );
    let ctx = Context::new();

    let output = engine.handle_call(
        &ctx,
        br#"[{"jsonrpc":"2.0","method":"n","params":{}},{"jsonrpc":"2.0","method":"n"}]"#,
    );

    assert!(output.is_none());
}

#[test]
fn scenario_8_null_id_rejected() {
    let engine = Engine::new();
    let ctx = Context::new();

    let output = engine
        .handle_call(
            &ctx,
            br#"{"jsonrpc":"2.0","method":"m","params":{},"id":null}"#,
        )
        .unwrap();

    let value: Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(value["error"]["code"], 8);
    assert_eq!(value["error"]["message"], "Use of null as id is discouraged");
    assert!(value.get("id").is_none());
}
