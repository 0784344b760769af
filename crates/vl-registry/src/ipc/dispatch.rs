//! Invocation dispatcher.
//!
//! Routes `function(username, role, args...)` to the registry service and
//! serializes the outcome. Wrong arity and undecodable arguments are user
//! errors, never panics.

use super::payloads::InvocationResponse;
use crate::domain::entities::{NewCar, RegistrationData};
use crate::domain::errors::RegistryError;
use crate::domain::roles::{authorize, Caller, Operation, Role};
use crate::ports::inbound::VehicleRegistryApi;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{info, warn};

/// Invocation surface over a registry service.
pub struct InvocationHandler<S> {
    service: S,
}

impl<S: VehicleRegistryApi> InvocationHandler<S> {
    pub fn new(service: S) -> Self {
        Self { service }
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub fn service_mut(&mut self) -> &mut S {
        &mut self.service
    }

    pub fn into_inner(self) -> S {
        self.service
    }

    /// Handles one invocation. `args` starts with username and role.
    pub fn invoke(&mut self, function: &str, args: &[String]) -> InvocationResponse {
        match self.dispatch(function, args) {
            Ok(payload) => InvocationResponse::success(payload),
            Err(err) => {
                warn!(function, kind = ?err.kind(), error = %err, "invocation failed");
                InvocationResponse::failure(err)
            }
        }
    }

    fn dispatch(&mut self, function: &str, args: &[String]) -> Result<Option<Vec<u8>>, RegistryError> {
        let operation = Operation::from_name(function).ok_or_else(|| {
            RegistryError::validation(format!("Invoke did not find function: {function}"))
        })?;
        let [username, role, rest @ ..] = args else {
            return Err(RegistryError::validation(
                "Invoke expects 'username' and 'role' as first two args.",
            ));
        };
        let role: Role = role.parse()?;
        authorize(role, operation)?;
        let arity = operation.arity();
        if !arity.accepts(rest.len()) {
            return Err(RegistryError::validation(format!(
                "Incorrect number of arguments for '{}': expecting {}, got {}",
                operation,
                arity,
                rest.len()
            )));
        }

        let caller = Caller::new(username.as_str(), role);
        info!(function = operation.name(), username = %caller.username, role = %role, "invoke");
        let svc = &mut self.service;

        match operation {
            Operation::Create => {
                let car: NewCar = parse_json("car", &rest[0])?;
                let registration = rest
                    .get(1)
                    .map(|raw| parse_json::<RegistrationData>("registration data", raw))
                    .transpose()?;
                to_payload(&svc.create_car(&caller, car, registration)?)
            }
            Operation::Read => Ok(svc.read(&caller, &rest[0])?),
            Operation::ReadCar => to_payload(&svc.read_car(&caller, &rest[0])?),
            Operation::GetHistory => to_payload(&svc.car_history(&caller, &rest[0])?),
            Operation::Register => to_payload(&svc.register_car(&caller, &rest[0])?),
            Operation::Confirm => to_payload(&svc.confirm_car(&caller, &rest[0], &rest[1])?),
            Operation::Revoke => to_payload(&svc.revoke_car(&caller, &rest[0])?),
            Operation::Delete => to_payload(&svc.delete_car(&caller, &rest[0])?),
            Operation::ReadRegistrationProposals => {
                to_payload(&svc.registration_proposals(&caller)?)
            }
            Operation::GetRevocationProposals => to_payload(&svc.revocation_proposals(&caller)?),
            Operation::GetCarsToConfirm => to_payload(&svc.cars_to_confirm(&caller)?),
            Operation::InsureProposal => {
                to_payload(&svc.insure_proposal(&caller, &rest[0], &rest[1])?)
            }
            Operation::InsuranceAccept => {
                to_payload(&svc.insurance_accept(&caller, &rest[0], &rest[1], &rest[2])?)
            }
            Operation::GetInsurer => to_payload(&svc.get_insurer(&caller, &rest[0])?),
            Operation::RevocationProposal => {
                to_payload(&svc.revocation_proposal(&caller, &rest[0])?)
            }
            Operation::Transfer => to_payload(&svc.transfer(&caller, &rest[0], &rest[1])?),
            Operation::Sell => {
                let price = parse_amount("price", &rest[0])?;
                to_payload(&svc.sell(&caller, price, &rest[1], &rest[2])?)
            }
            Operation::CreateSellingOffer => {
                let price = parse_amount("price", &rest[0])?;
                to_payload(&svc.create_selling_offer(&caller, price, &rest[1], &rest[2])?)
            }
            Operation::AcceptOffer => to_payload(&svc.accept_offer(&caller, &rest[0])?),
            Operation::CreateUser => to_payload(&svc.create_user(&caller, &rest[0])?),
            Operation::ReadUser => to_payload(&svc.read_user(&caller)?),
            Operation::UpdateBalance => {
                let amount = parse_amount("amount", &rest[0])?;
                to_payload(&svc.update_balance(&caller, amount)?)
            }
            Operation::DeleteUser => to_payload(&svc.delete_user(&caller, &rest[0], &rest[1])?),
        }
    }
}

fn parse_json<T: DeserializeOwned>(what: &str, raw: &str) -> Result<T, RegistryError> {
    serde_json::from_str(raw)
        .map_err(|e| RegistryError::validation(format!("malformed {what} payload: {e}")))
}

fn parse_amount(what: &str, raw: &str) -> Result<i64, RegistryError> {
    raw.trim()
        .parse()
        .map_err(|_| RegistryError::validation(format!("{what} must be an integer, got '{raw}'")))
}

fn to_payload<T: Serialize>(value: &T) -> Result<Option<Vec<u8>>, RegistryError> {
    serde_json::to_vec(value)
        .map(Some)
        .map_err(|e| RegistryError::InvariantViolation(format!("cannot encode response: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{FixedTimeSource, InMemoryKVStore, JsonCarCodec};
    use crate::domain::config::RegistryConfig;
    use crate::domain::errors::ErrorKind;
    use crate::service::{RegistryDependencies, VehicleRegistryService};

    type Handler = InvocationHandler<VehicleRegistryService<InMemoryKVStore, FixedTimeSource>>;

    fn handler() -> Handler {
        let deps = RegistryDependencies {
            kv_store: InMemoryKVStore::new(),
            time_source: FixedTimeSource(42),
            codec: JsonCarCodec,
        };
        InvocationHandler::new(VehicleRegistryService::new(deps, RegistryConfig::default()))
    }

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_unknown_function_is_validation_error() {
        let response = handler().invoke("teleport", &args(&["amag", "garage"]));
        assert_eq!(response.error_kind(), Some(ErrorKind::Validation));
        assert!(response.error.unwrap().message.contains("teleport"));
    }

    #[test]
    fn test_missing_identity_is_validation_error() {
        let response = handler().invoke("readUser", &args(&["amag"]));
        assert_eq!(response.error_kind(), Some(ErrorKind::Validation));
    }

    #[test]
    fn test_unknown_role_is_validation_error() {
        let response = handler().invoke("create", &args(&["amag", "mechanic", "{}"]));
        assert_eq!(response.error_kind(), Some(ErrorKind::Validation));
    }

    #[test]
    fn test_denial_precedes_arity_check() {
        let response = handler().invoke("register", &args(&["amag", "garage"]));
        assert_eq!(response.error_kind(), Some(ErrorKind::AuthorizationDenied));
        let message = response.error.unwrap().message;
        assert!(message.contains("'garage'"), "{message}");
    }

    #[test]
    fn test_wrong_arity_is_validation_error() {
        let mut handler = handler();
        let response = handler.invoke("confirm", &args(&["amag", "dot", "WVW1"]));
        assert_eq!(response.error_kind(), Some(ErrorKind::Validation));
        let response = handler.invoke("readUser", &args(&["amag", "user", "extra"]));
        assert_eq!(response.error_kind(), Some(ErrorKind::Validation));
    }

    #[test]
    fn test_create_returns_car_json() {
        let mut handler = handler();
        let response = handler.invoke("create", &args(&["amag", "garage", r#"{"vin":"WVW1"}"#]));

        assert!(response.is_ok(), "{:?}", response.error);
        let car = response.payload_json().unwrap();
        assert_eq!(car["vin"], "WVW1");
        assert_eq!(car["createdTs"], 42);
    }

    #[test]
    fn test_malformed_registration_data_writes_nothing() {
        let mut handler = handler();
        let response = handler.invoke(
            "create",
            &args(&["amag", "garage", r#"{"vin":"WVW1"}"#, "{not json"]),
        );

        assert_eq!(response.error_kind(), Some(ErrorKind::Validation));
        assert!(handler.service().repository().store().is_empty());
    }

    #[test]
    fn test_non_integer_price_is_validation_error() {
        let response = handler().invoke("sell", &args(&["amag", "garage", "lots", "WVW1", "bobby"]));
        assert_eq!(response.error_kind(), Some(ErrorKind::Validation));
    }

    #[test]
    fn test_verifier_cannot_be_named() {
        let response = handler().invoke("read", &args(&["amag", "verifier", "car:WVW1"]));
        assert_eq!(response.error_kind(), Some(ErrorKind::Validation));
        let response = handler().invoke("read", &args(&["amag", "dot", "car:WVW1"]));
        assert_eq!(response.error_kind(), Some(ErrorKind::AuthorizationDenied));
    }
}
