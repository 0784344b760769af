//! # Ownership Flows
//!
//! Transfer, sale and selling offers, including the compensation paths taken
//! when the ledger rejects a write halfway through.

#[cfg(test)]
mod tests {
    use crate::harness::*;
    use proptest::prelude::*;
    use vl_registry::test_utils::FaultyKVStore;
    use vl_registry::{ErrorKind, InMemoryKVStore, InvocationHandler, RegistryConfig};

    fn with_car<KV: vl_registry::KeyValueStore>(h: &mut TestHandler<KV>, vin: &str) {
        call(h, "create", "amag", "garage", &[&car_json(vin)]);
    }

    fn faults(h: &mut TestHandler<FaultyKVStore>) -> &mut FaultyKVStore {
        h.service_mut().repository_mut().store_mut()
    }

    // =============================================================================
    // SALE
    // =============================================================================

    #[test]
    fn test_sell_scenario() {
        let mut h = in_memory_handler();
        with_car(&mut h, "WVW1");

        let car = call(&mut h, "sell", "amag", "garage", &["99", "WVW1", "bobby"]);

        assert_eq!(car["vin"], "WVW1");
        assert_eq!(balance_of(&h, "bobby"), 1);
        assert_eq!(balance_of(&h, "amag"), 199);
        assert_eq!(owner_of(&h, "WVW1").as_deref(), Some("bobby"));

        let bobby = call(&mut h, "readUser", "bobby", "user", &[]);
        assert_eq!(bobby["cars"], serde_json::json!(["WVW1"]));
        let amag = call(&mut h, "readUser", "amag", "garage", &[]);
        assert_eq!(amag["cars"], serde_json::json!([]));
    }

    #[test]
    fn test_resale_by_new_owner() {
        let mut h = in_memory_handler();
        with_car(&mut h, "WVW1");
        call(&mut h, "sell", "amag", "garage", &["50", "WVW1", "bobby"]);

        assert_eq!(
            error_kind(&mut h, "sell", "amag", "garage", &["10", "WVW1", "carla"]),
            Some(ErrorKind::AuthorizationDenied)
        );
        call(&mut h, "sell", "bobby", "user", &["10", "WVW1", "carla"]);

        assert_eq!(owner_of(&h, "WVW1").as_deref(), Some("carla"));
        assert_eq!(balance_of(&h, "bobby"), 60);
        assert_eq!(balance_of(&h, "carla"), 90);
    }

    #[test]
    fn test_sale_of_confirmed_car_requires_revocation() {
        let mut h = in_memory_handler();
        with_car(&mut h, "WVW1");
        call(&mut h, "register", "amag", "dot", &["WVW1"]);
        call(&mut h, "insureProposal", "amag", "user", &["WVW1", "axa"]);
        call(&mut h, "insuranceAccept", "axa", "insurer", &["amag", "WVW1", "axa"]);
        call(&mut h, "confirm", "amag", "dot", &["WVW1", "ZH 7878"]);

        assert_eq!(
            error_kind(&mut h, "sell", "amag", "garage", &["10", "WVW1", "bobby"]),
            Some(ErrorKind::PreconditionFailed)
        );
        assert_eq!(balance_of(&h, "amag"), 100);

        call(&mut h, "revoke", "amag", "dot", &["WVW1"]);
        let car = call(&mut h, "sell", "amag", "garage", &["10", "WVW1", "bobby"]);
        assert_eq!(car["certificate"]["username"], "bobby");
    }

    // =============================================================================
    // OFFERS
    // =============================================================================

    #[test]
    fn test_offer_and_accept() {
        let mut h = in_memory_handler();
        with_car(&mut h, "WVW1");

        let offer = call(
            &mut h,
            "createSellingOffer",
            "amag",
            "garage",
            &["25", "WVW1", "bobby"],
        );
        assert_eq!(offer["seller"], "amag");

        call(&mut h, "acceptOffer", "bobby", "user", &["WVW1"]);

        assert_eq!(owner_of(&h, "WVW1").as_deref(), Some("bobby"));
        assert_eq!(balance_of(&h, "bobby"), 75);
        assert_eq!(balance_of(&h, "amag"), 125);
        assert_eq!(
            error_kind(&mut h, "acceptOffer", "bobby", "user", &["WVW1"]),
            Some(ErrorKind::PreconditionFailed)
        );
    }

    // =============================================================================
    // COMPENSATION
    // =============================================================================

    #[test]
    fn test_failed_index_write_rolls_back_sale() {
        let mut h = faulty_handler();
        with_car(&mut h, "WVW1");
        call(&mut h, "createUser", "bobby", "user", &["bobby"]);
        faults(&mut h).fail_writes_to("index:cars:", 0);

        assert_eq!(
            error_kind(&mut h, "sell", "amag", "garage", &["60", "WVW1", "bobby"]),
            Some(ErrorKind::Storage)
        );

        faults(&mut h).heal();
        assert_eq!(balance_of(&h, "amag"), 100);
        assert_eq!(balance_of(&h, "bobby"), 100);
        assert_eq!(owner_of(&h, "WVW1").as_deref(), Some("amag"));
        let car = h.service().repository().load_car("WVW1").unwrap();
        assert_eq!(car.certificate, None);
    }

    #[test]
    fn test_failed_rollback_reports_possible_inconsistency() {
        let mut h = faulty_handler();
        with_car(&mut h, "WVW1");
        call(&mut h, "createUser", "bobby", "user", &["bobby"]);
        faults(&mut h)
            .fail_writes_to("index:cars:", 0)
            .fail_writes_to("user:", 4);

        let response = invoke(&mut h, "sell", "amag", "garage", &["60", "WVW1", "bobby"]);

        let error = response.error.unwrap();
        assert_eq!(error.kind, ErrorKind::CompensationFailure);
        assert!(error.message.contains("possibly inconsistent"));
    }

    #[test]
    fn test_transfer_to_new_user_rolled_back_removes_user() {
        let mut h = faulty_handler();
        with_car(&mut h, "WVW1");
        faults(&mut h).fail_writes_to("index:cars:", 0);

        assert_eq!(
            error_kind(&mut h, "transfer", "amag", "garage", &["WVW1", "dora"]),
            Some(ErrorKind::Storage)
        );

        let repo = h.service().repository();
        assert_eq!(repo.find_user("dora").unwrap(), None);
        assert!(repo.load_user("amag").unwrap().owns("WVW1"));
    }

    #[test]
    fn test_delete_user_moves_balance() {
        let mut h = in_memory_handler();
        call(&mut h, "createUser", "ministry", "dot", &["bobby"]);
        call(&mut h, "createUser", "ministry", "dot", &["carla"]);
        call(&mut h, "updateBalance", "bobby", "user", &["-30"]);

        let carla = call(&mut h, "deleteUser", "ministry", "dot", &["bobby", "carla"]);

        assert_eq!(carla["balance"], 170);
        assert_eq!(
            error_kind(&mut h, "readUser", "bobby", "user", &[]),
            Some(ErrorKind::NotFound)
        );
    }

    proptest! {
        #[test]
        fn sale_moves_exactly_the_price(price in 0i64..=100, starting in 100i64..=500) {
            let config = RegistryConfig { starting_balance: starting, ..RegistryConfig::default() };
            let mut h = InvocationHandler::new(service_with(InMemoryKVStore::new(), config));
            with_car(&mut h, "WVW1");
            call(&mut h, "createUser", "bobby", "user", &["bobby"]);

            call(&mut h, "sell", "amag", "garage", &[&price.to_string(), "WVW1", "bobby"]);

            prop_assert_eq!(balance_of(&h, "amag"), starting + price);
            prop_assert_eq!(balance_of(&h, "bobby"), starting - price);
            prop_assert_eq!(balance_of(&h, "amag") + balance_of(&h, "bobby"), 2 * starting);
        }

        #[test]
        fn rejected_index_write_restores_balances(price in 0i64..=100) {
            let mut h = faulty_handler();
            with_car(&mut h, "WVW1");
            call(&mut h, "createUser", "bobby", "user", &["bobby"]);
            faults(&mut h).fail_writes_to("index:cars:", 0);

            let response = invoke(&mut h, "sell", "amag", "garage", &[&price.to_string(), "WVW1", "bobby"]);

            prop_assert_eq!(response.error_kind(), Some(ErrorKind::Storage));
            prop_assert_eq!(balance_of(&h, "amag"), 100);
            prop_assert_eq!(balance_of(&h, "bobby"), 100);
            let owner = owner_of(&h, "WVW1");
            prop_assert_eq!(owner.as_deref(), Some("amag"));
        }
    }
}
