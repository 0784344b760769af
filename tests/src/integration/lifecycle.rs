//! # Certification Flows
//!
//! garage → DOT → owner → insurer → DOT, each step a separate invocation.

#[cfg(test)]
mod tests {
    use crate::harness::*;
    use serde_json::json;
    use tempfile::tempdir;
    use vl_registry::{ErrorKind, FileBackedKVStore};

    // =============================================================================
    // FULL LIFECYCLE
    // =============================================================================

    #[test]
    fn test_full_certification_lifecycle() {
        let mut h = in_memory_handler();

        let car = call(&mut h, "create", "amag", "garage", &[&car_json("WVW1")]);
        assert_eq!(car["vin"], "WVW1");
        assert_eq!(car["createdTs"], TEST_NOW);
        assert_eq!(owner_of(&h, "WVW1").as_deref(), Some("amag"));

        let proposals = call(&mut h, "readRegistrationProposals", "ministry", "dot", &[]);
        assert_eq!(proposals["WVW1"]["username"], "amag");

        let car = call(&mut h, "register", "amag", "dot", &["WVW1"]);
        assert_eq!(car["certificate"]["vin"], "WVW1");

        let proposal = call(&mut h, "insureProposal", "amag", "user", &["WVW1", "axa"]);
        assert_eq!(proposal, json!({ "user": "amag", "car": "WVW1" }));

        let insurer = call(&mut h, "getInsurer", "axa", "insurer", &["axa"]);
        assert_eq!(insurer["proposals"].as_array().map(Vec::len), Some(1));

        call(&mut h, "insuranceAccept", "axa", "insurer", &["amag", "WVW1", "axa"]);

        let pending = call(&mut h, "getCarsToConfirm", "ministry", "dot", &[]);
        assert_eq!(pending.as_array().map(Vec::len), Some(1));

        let car = call(&mut h, "confirm", "ministry", "dot", &["WVW1", "ZH 7878"]);
        assert_eq!(car["certificate"]["numberplate"], "ZH 7878");
        assert_eq!(car["certificate"]["insurer"], "axa");

        call(&mut h, "revocationProposal", "amag", "user", &["WVW1"]);
        let revocations = call(&mut h, "getRevocationProposals", "ministry", "dot", &[]);
        assert_eq!(revocations["WVW1"]["username"], "amag");

        let car = call(&mut h, "revoke", "amag", "dot", &["WVW1"]);
        assert!(car["certificate"].get("insurer").is_none());
        assert!(car["certificate"].get("numberplate").is_none());

        let history = call(&mut h, "getHistory", "ministry", "dot", &["WVW1"]);
        assert_eq!(history.as_array().map(Vec::len), Some(5));

        call(&mut h, "delete", "ministry", "dot", &["WVW1"]);
        assert_eq!(owner_of(&h, "WVW1"), None);
        assert_eq!(
            error_kind(&mut h, "readCar", "amag", "user", &["WVW1"]),
            Some(ErrorKind::NotFound)
        );
    }

    // =============================================================================
    // SCENARIOS
    // =============================================================================

    #[test]
    fn test_duplicate_create_is_precondition_failure() {
        let mut h = in_memory_handler();
        call(&mut h, "create", "amag", "garage", &[&car_json("WVW1")]);

        assert_eq!(
            error_kind(&mut h, "create", "amag", "garage", &[&car_json("WVW1")]),
            Some(ErrorKind::PreconditionFailed)
        );
    }

    #[test]
    fn test_register_before_create_is_precondition_failure() {
        let mut h = in_memory_handler();

        assert_eq!(
            error_kind(&mut h, "register", "amag", "dot", &["WVW1"]),
            Some(ErrorKind::PreconditionFailed)
        );
    }

    #[test]
    fn test_confirm_waits_for_insurance() {
        let mut h = in_memory_handler();
        call(&mut h, "create", "amag", "garage", &[&car_json("WVW1")]);
        call(&mut h, "register", "amag", "dot", &["WVW1"]);

        assert_eq!(
            error_kind(&mut h, "confirm", "amag", "dot", &["WVW1", "ZH 7878"]),
            Some(ErrorKind::PreconditionFailed)
        );

        call(&mut h, "insureProposal", "amag", "user", &["WVW1", "axa"]);
        call(&mut h, "insuranceAccept", "axa", "insurer", &["amag", "WVW1", "axa"]);
        let car = call(&mut h, "confirm", "amag", "dot", &["WVW1", "ZH 7878"]);

        assert_eq!(car["certificate"]["numberplate"], "ZH 7878");
    }

    #[test]
    fn test_create_with_registration_data() {
        let mut h = in_memory_handler();
        let data = json!({
            "numberOfDoors": "4+1",
            "numberOfCylinders": 4,
            "numberOfAxis": 2,
            "maxSpeed": 200
        })
        .to_string();

        call(&mut h, "create", "amag", "garage", &[&car_json("WVW1"), &data]);

        let proposals = call(&mut h, "readRegistrationProposals", "ministry", "dot", &[]);
        assert_eq!(proposals["WVW1"]["maxSpeed"], 200);
        assert_eq!(proposals["WVW1"]["numberOfDoors"], "4+1");
    }

    // =============================================================================
    // AUTHORIZATION
    // =============================================================================

    #[test]
    fn test_roles_are_enforced_at_each_hand_off() {
        let mut h = in_memory_handler();
        call(&mut h, "create", "amag", "garage", &[&car_json("WVW1")]);

        let denied = [
            ("create", "user", vec![car_json("WVW2")]),
            ("register", "garage", vec!["WVW1".to_string()]),
            ("insureProposal", "dot", vec!["WVW1".to_string(), "axa".to_string()]),
            (
                "insuranceAccept",
                "user",
                vec!["amag".to_string(), "WVW1".to_string(), "axa".to_string()],
            ),
            ("confirm", "insurer", vec!["WVW1".to_string(), "ZH 1".to_string()]),
            ("transfer", "dot", vec!["WVW1".to_string(), "bobby".to_string()]),
            ("read", "dot", vec!["car:WVW1".to_string()]),
        ];
        for (function, role, args) in denied {
            let args: Vec<&str> = args.iter().map(String::as_str).collect();
            let message = call_err(&mut h, function, "amag", role, &args);
            assert!(message.starts_with("Sorry, role"), "{function}: {message}");
        }

        // nothing beyond the first create was written
        assert_eq!(owner_of(&h, "WVW2"), None);
        assert!(h.service().repository().find_insurer("axa").unwrap().is_none());
    }

    #[test]
    fn test_read_user_is_self_only() {
        let mut h = in_memory_handler();
        call(&mut h, "createUser", "amag", "user", &["bobby"]);

        let user = call(&mut h, "readUser", "bobby", "user", &[]);
        assert_eq!(user["name"], "bobby");
        assert_eq!(user["balance"], 100);
        assert_eq!(
            error_kind(&mut h, "readUser", "carla", "user", &[]),
            Some(ErrorKind::NotFound)
        );
    }

    // =============================================================================
    // DURABILITY
    // =============================================================================

    #[test]
    fn test_file_backed_ledger_across_invocations() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ledger.json");
        let open = || handler_with(FileBackedKVStore::open(&path).unwrap());

        call(&mut open(), "create", "amag", "garage", &[&car_json("WVW1")]);
        call(&mut open(), "register", "amag", "dot", &["WVW1"]);

        let mut h = open();
        let car = call(&mut h, "readCar", "amag", "user", &["WVW1"]);
        assert_eq!(car["certificate"]["username"], "amag");
        assert_eq!(
            h.service().repository().registration_proposals().unwrap().len(),
            0
        );
    }
}
