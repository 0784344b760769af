//! Shared fixtures for integration flows and benchmarks.

use serde_json::Value;
use vl_registry::test_utils::FaultyKVStore;
use vl_registry::{
    ErrorKind, FixedTimeSource, InMemoryKVStore, InvocationHandler, InvocationResponse,
    JsonCarCodec, KeyValueStore, RegistryConfig, RegistryDependencies, VehicleRegistryService,
};

/// Creation timestamp used by every test clock.
pub const TEST_NOW: u64 = 1_700_000_000;

pub type TestService<KV> = VehicleRegistryService<KV, FixedTimeSource>;
pub type TestHandler<KV = InMemoryKVStore> = InvocationHandler<TestService<KV>>;

pub fn service_with<KV: KeyValueStore>(kv_store: KV, config: RegistryConfig) -> TestService<KV> {
    let deps = RegistryDependencies {
        kv_store,
        time_source: FixedTimeSource(TEST_NOW),
        codec: JsonCarCodec,
    };
    VehicleRegistryService::new(deps, config)
}

pub fn handler_with<KV: KeyValueStore>(kv_store: KV) -> TestHandler<KV> {
    InvocationHandler::new(service_with(kv_store, RegistryConfig::default()))
}

pub fn in_memory_handler() -> TestHandler {
    handler_with(InMemoryKVStore::new())
}

pub fn faulty_handler() -> TestHandler<FaultyKVStore> {
    handler_with(FaultyKVStore::new())
}

/// `function(username, role, args...)`, asserting success. Returns the
/// JSON payload (or `Value::Null` for an empty one).
pub fn call<KV: KeyValueStore>(
    handler: &mut TestHandler<KV>,
    function: &str,
    username: &str,
    role: &str,
    args: &[&str],
) -> Value {
    let response = invoke(handler, function, username, role, args);
    assert!(
        response.is_ok(),
        "{function} by {username}/{role} failed: {:?}",
        response.error
    );
    response.payload_json().unwrap_or(Value::Null)
}

/// `function(username, role, args...)`, asserting failure. Returns the
/// error message.
pub fn call_err<KV: KeyValueStore>(
    handler: &mut TestHandler<KV>,
    function: &str,
    username: &str,
    role: &str,
    args: &[&str],
) -> String {
    let response = invoke(handler, function, username, role, args);
    let error = response
        .error
        .unwrap_or_else(|| panic!("{function} by {username}/{role} unexpectedly succeeded"));
    error.message
}

pub fn invoke<KV: KeyValueStore>(
    handler: &mut TestHandler<KV>,
    function: &str,
    username: &str,
    role: &str,
    args: &[&str],
) -> InvocationResponse {
    let mut full = vec![username.to_string(), role.to_string()];
    full.extend(args.iter().map(|a| a.to_string()));
    handler.invoke(function, &full)
}

pub fn error_kind<KV: KeyValueStore>(
    handler: &mut TestHandler<KV>,
    function: &str,
    username: &str,
    role: &str,
    args: &[&str],
) -> Option<ErrorKind> {
    invoke(handler, function, username, role, args).error_kind()
}

/// Balance of `name`, read directly from the repository.
pub fn balance_of<KV: KeyValueStore>(handler: &TestHandler<KV>, name: &str) -> i64 {
    handler
        .service()
        .repository()
        .load_user(name)
        .map(|u| u.balance)
        .unwrap_or_else(|e| panic!("user '{name}' unreadable: {e}"))
}

pub fn owner_of<KV: KeyValueStore>(handler: &TestHandler<KV>, vin: &str) -> Option<String> {
    handler
        .service()
        .repository()
        .car_owner(vin)
        .unwrap_or_else(|e| panic!("car index unreadable: {e}"))
}

/// `{"vin": <vin>}` as accepted by `create`.
pub fn car_json(vin: &str) -> String {
    serde_json::json!({ "vin": vin }).to_string()
}
