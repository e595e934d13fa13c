// ==========================================
// 门票生命周期集成测试
// ==========================================
// 覆盖: 购票（部分成功/售罄/支付拒绝）、转让上限、闸机核验、退票、过期扫描
// ==========================================

mod helpers;

#[cfg(test)]
mod ticket_lifecycle_test {
    use std::sync::{Arc, OnceLock};

    use chrono::Duration;
    use worldcup_ticketing::domain::{
        MatchPhase, Outcome, RejectReason, SeatInventory, TicketCategory, TicketStatus,
        TransactionStatus, TransactionType, ZoneType,
    };
    use worldcup_ticketing::engine::{
        FixedPaymentGateway, PaymentGateway, ScriptedPaymentGateway, ZoneInventory,
    };

    use crate::helpers::test_app::TestApp;
    use crate::helpers::test_data_builder::MatchRequestBuilder;

    // ==========================================
    // 购票
    // ==========================================

    #[test]
    fn test_purchase_more_than_zone_available_yields_exactly_available() {
        let app = TestApp::new();
        let fan = app.spectator("fan@example.com");
        let m = app.upcoming_match(80);
        let vip = app.zone(&m.match_id, ZoneType::Vip);
        assert_eq!(vip.capacity, 2);

        let report = app
            .state
            .ticket_api
            .purchase_tickets(&fan.user_id, &m.match_id, Some(&vip.zone_id), TicketCategory::Standard, 5)
            .unwrap();

        assert_eq!(report.purchased_count(), 2);
        assert!(!report.is_complete());
        assert_eq!(report.rejections.len(), 1);
        assert!(matches!(report.rejections[0], RejectReason::ZoneSoldOut { .. }));
        assert!(report.tickets.iter().all(|t| t.status == TicketStatus::Valid));
        // 100 × 1.0 × 3.0 × 1.0
        assert!(report.tickets.iter().all(|t| (t.price - 300.0).abs() < 1e-9));

        let vip = app.reload_zone(&m.match_id, &vip.zone_id);
        assert_eq!(vip.available, 0);
        assert!(!vip.has_available());
        assert_eq!(app.reload_match(&m.match_id).tickets_available, 78);
    }

    #[test]
    fn test_purchase_more_than_match_available_stops_at_sold_out() {
        let app = TestApp::new();
        let fan = app.spectator("fan@example.com");
        let m = app.upcoming_match(3);

        let report = app
            .state
            .ticket_api
            .purchase_tickets(&fan.user_id, &m.match_id, None, TicketCategory::Standard, 5)
            .unwrap();

        assert_eq!(report.purchased_count(), 3);
        assert_eq!(report.rejections, vec![RejectReason::MatchSoldOut]);
        assert_eq!(app.reload_match(&m.match_id).tickets_available, 0);

        let user = app.state.user_api.get_user(&fan.user_id).unwrap().unwrap();
        assert_eq!(user.as_spectator().unwrap().tickets_purchased, 3);
    }

    #[test]
    fn test_purchase_zero_quantity_is_rejected() {
        let app = TestApp::new();
        let fan = app.spectator("fan@example.com");
        let m = app.upcoming_match(80);

        let report = app
            .state
            .ticket_api
            .purchase_tickets(&fan.user_id, &m.match_id, None, TicketCategory::Standard, 0)
            .unwrap();
        assert_eq!(report.purchased_count(), 0);
        assert_eq!(
            report.rejections,
            vec![RejectReason::InvalidQuantity { quantity: 0 }]
        );
    }

    #[test]
    fn test_purchase_rejects_unknown_or_non_spectator_buyer() {
        let app = TestApp::new();
        let admin = app.admin("admin@example.com", true);
        let m = app.upcoming_match(80);

        let report = app
            .state
            .ticket_api
            .purchase_tickets(&admin.user_id, &m.match_id, None, TicketCategory::Standard, 1)
            .unwrap();
        assert_eq!(report.rejections[0].code(), "NOT_SPECTATOR");

        let report = app
            .state
            .ticket_api
            .purchase_tickets("nobody", &m.match_id, None, TicketCategory::Standard, 1)
            .unwrap();
        assert!(matches!(
            report.rejections[0],
            RejectReason::SpectatorNotFound { .. }
        ));
        assert_eq!(app.reload_match(&m.match_id).tickets_available, 80);
    }

    #[test]
    fn test_purchase_rejects_zone_of_other_match() {
        let app = TestApp::new();
        let fan = app.spectator("fan@example.com");
        let m1 = app.upcoming_match(80);
        let m2 = app.upcoming_match(80);
        let foreign = app.zone(&m2.match_id, ZoneType::NorthStand);

        let report = app
            .state
            .ticket_api
            .purchase_tickets(&fan.user_id, &m1.match_id, Some(&foreign.zone_id), TicketCategory::Standard, 1)
            .unwrap();
        assert!(matches!(
            report.rejections[0],
            RejectReason::ZoneNotInMatch { .. }
        ));
    }

    #[test]
    fn test_purchase_for_completed_match_is_event_over() {
        let app = TestApp::new();
        let fan = app.spectator("fan@example.com");
        let m = app.upcoming_match(80);
        assert!(app.state.match_api.complete_match(&m.match_id, 2, 1).unwrap().is_accepted());

        let report = app
            .state
            .ticket_api
            .purchase_tickets(&fan.user_id, &m.match_id, None, TicketCategory::Standard, 1)
            .unwrap();
        assert_eq!(report.rejections, vec![RejectReason::EventOver]);
    }

    #[test]
    fn test_refused_payment_records_refused_transaction_and_keeps_inventory() {
        let app = TestApp::with_gateway(Arc::new(FixedPaymentGateway::refusing()));
        let fan = app.spectator("fan@example.com");
        let m = app.upcoming_match(80);

        let report = app
            .state
            .ticket_api
            .purchase_tickets(&fan.user_id, &m.match_id, None, TicketCategory::Premium, 3)
            .unwrap();

        assert_eq!(report.purchased_count(), 0);
        assert_eq!(report.rejections.len(), 3);
        assert!(report
            .rejections
            .iter()
            .all(|r| r.code() == "PAYMENT_REFUSED"));
        assert_eq!(app.reload_match(&m.match_id).tickets_available, 80);

        let txs = app.state.ticket_api.transactions_of_user(&fan.user_id).unwrap();
        assert_eq!(txs.len(), 3);
        assert!(txs
            .iter()
            .all(|t| t.status == TransactionStatus::Refused && t.ticket_id.is_none()));
    }

    #[test]
    fn test_refused_payment_does_not_stop_remaining_units() {
        let app = TestApp::with_gateway(Arc::new(ScriptedPaymentGateway::new([false, true])));
        let fan = app.spectator("fan@example.com");
        let m = app.upcoming_match(80);

        let report = app
            .state
            .ticket_api
            .purchase_tickets(&fan.user_id, &m.match_id, None, TicketCategory::Standard, 2)
            .unwrap();

        assert_eq!(report.purchased_count(), 1);
        assert_eq!(report.rejections.len(), 1);
        assert_eq!(app.reload_match(&m.match_id).tickets_available, 79);
    }

    /// 扣款期间另一渠道抢走比赛最后一张票
    struct DrainingGateway {
        target: OnceLock<(Arc<ZoneInventory>, String)>,
    }

    impl PaymentGateway for DrainingGateway {
        fn process_payment(&self, _user_id: &str, _amount: f64, _reference: &str) -> bool {
            if let Some((inventory, match_id)) = self.target.get() {
                assert!(inventory.decrement_match(match_id).unwrap());
            }
            true
        }
    }

    #[test]
    fn test_seat_lost_after_payment_is_refunded_in_ledger() {
        let gateway = Arc::new(DrainingGateway {
            target: OnceLock::new(),
        });
        let app = TestApp::with_gateway(gateway.clone());
        let fan = app.spectator("fan@example.com");
        let m = app.upcoming_match(1);
        gateway
            .target
            .set((app.state.zone_inventory.clone(), m.match_id.clone()))
            .ok()
            .unwrap();

        let report = app
            .state
            .ticket_api
            .purchase_tickets(&fan.user_id, &m.match_id, None, TicketCategory::Standard, 1)
            .unwrap();

        assert_eq!(report.purchased_count(), 0);
        assert_eq!(report.rejections, vec![RejectReason::MatchSoldOut]);
        assert_eq!(app.reload_match(&m.match_id).tickets_available, 0);
        assert!(app.state.ticket_api.tickets_of_spectator(&fan.user_id).unwrap().is_empty());

        let txs = app.state.ticket_api.transactions_of_user(&fan.user_id).unwrap();
        assert_eq!(txs.len(), 2);
        let purchase = txs
            .iter()
            .find(|t| t.tx_type == TransactionType::Purchase)
            .expect("扣款流水必须落库");
        assert_eq!(purchase.status, TransactionStatus::Refunded);
        assert!(purchase.ticket_id.is_none());
        let refund = txs
            .iter()
            .find(|t| t.tx_type == TransactionType::Refund)
            .expect("冲正流水必须落库");
        assert_eq!(refund.status, TransactionStatus::Validated);
        assert!(refund.ticket_id.is_none());
        assert!((refund.amount - purchase.amount).abs() < 1e-9);
    }

    // ==========================================
    // 定价
    // ==========================================

    #[test]
    fn test_price_formula() {
        let app = TestApp::new();
        let api = &app.state.ticket_api;

        let vip_final = api.calculate_price(Some(100.0), TicketCategory::Vip, MatchPhase::Final);
        assert!((vip_final - 1500.0).abs() < 1e-9);

        let standard_group =
            api.calculate_price(Some(100.0), TicketCategory::Standard, MatchPhase::GroupStage);
        assert!((standard_group - 100.0).abs() < 1e-9);

        let zone_price =
            api.calculate_zone_price(Some(100.0), TicketCategory::Vip, 3.0, MatchPhase::Final);
        assert!((zone_price - 4500.0).abs() < 1e-9);
    }

    #[test]
    fn test_quote_uses_default_base_price_when_match_has_none() {
        let app = TestApp::new();
        let m = app.schedule(
            MatchRequestBuilder::new()
                .base_price(None)
                .phase(MatchPhase::SemiFinal),
        );
        let east = app.zone(&m.match_id, ZoneType::EastStand);

        let quote = app
            .state
            .ticket_api
            .quote_price(&m.match_id, Some(&east.zone_id), TicketCategory::Standard)
            .unwrap()
            .accepted()
            .unwrap();
        // 100 × 1.0 × 1.2 × 2.0
        assert!((quote - 240.0).abs() < 1e-9);
    }

    // ==========================================
    // 转让
    // ==========================================

    #[test]
    fn test_transfer_limit_reached_after_three_transfers() {
        let app = TestApp::new();
        let owner = app.spectator("owner@example.com");
        for email in ["b@example.com", "c@example.com", "d@example.com", "e@example.com"] {
            app.spectator(email);
        }
        let m = app.upcoming_match(80);

        let ticket = app
            .state
            .ticket_api
            .purchase_tickets(&owner.user_id, &m.match_id, None, TicketCategory::Standard, 1)
            .unwrap()
            .tickets
            .remove(0);

        let mut qr = ticket.qr_code.clone();
        for email in ["b@example.com", "c@example.com", "d@example.com"] {
            let receipt = app
                .state
                .ticket_api
                .transfer_ticket(&ticket.ticket_id, email)
                .unwrap()
                .accepted()
                .expect("转让应成功");
            assert_ne!(receipt.ticket.qr_code, qr);
            assert_eq!(receipt.transaction.tx_type, TransactionType::Transfer);
            assert_eq!(receipt.transaction.amount, 0.0);
            qr = receipt.ticket.qr_code.clone();
        }

        let before = app.state.ticket_api.get_ticket(&ticket.ticket_id).unwrap().unwrap();
        assert_eq!(before.transfer_count, 3);
        assert_eq!(before.status, TicketStatus::Valid);

        let outcome = app
            .state
            .ticket_api
            .transfer_ticket(&ticket.ticket_id, "e@example.com")
            .unwrap();
        assert_eq!(
            outcome.rejection(),
            Some(&RejectReason::TransferLimitReached { limit: 3 })
        );

        let after = app.state.ticket_api.get_ticket(&ticket.ticket_id).unwrap().unwrap();
        assert_eq!(after, before);
        assert!(app
            .state
            .ticket_api
            .transferable_tickets(after.owner_id.as_deref().unwrap())
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_transfer_rejections() {
        let app = TestApp::new();
        let owner = app.spectator("owner@example.com");
        app.admin("admin@example.com", true);
        let m = app.upcoming_match(80);
        let ticket = app
            .state
            .ticket_api
            .purchase_tickets(&owner.user_id, &m.match_id, None, TicketCategory::Standard, 1)
            .unwrap()
            .tickets
            .remove(0);

        let api = &app.state.ticket_api;
        assert!(matches!(
            api.transfer_ticket(&ticket.ticket_id, "ghost@example.com").unwrap(),
            Outcome::Rejected(RejectReason::RecipientNotFound { .. })
        ));
        assert!(matches!(
            api.transfer_ticket(&ticket.ticket_id, "admin@example.com").unwrap(),
            Outcome::Rejected(RejectReason::NotSpectator { .. })
        ));
        assert_eq!(
            api.transfer_ticket(&ticket.ticket_id, "OWNER@example.com")
                .unwrap()
                .rejection(),
            Some(&RejectReason::SameOwner)
        );
        assert!(matches!(
            api.transfer_ticket("missing", "owner@example.com").unwrap(),
            Outcome::Rejected(RejectReason::TicketNotFound { .. })
        ));
    }

    #[test]
    fn test_transfer_after_kickoff_is_rejected() {
        let app = TestApp::new();
        let owner = app.spectator("owner@example.com");
        app.spectator("friend@example.com");
        let m = app.match_kicking_off_in(80, Duration::hours(-1));
        let ticket = app
            .state
            .ticket_api
            .purchase_tickets(&owner.user_id, &m.match_id, None, TicketCategory::Standard, 1)
            .unwrap()
            .tickets
            .remove(0);

        let outcome = app
            .state
            .ticket_api
            .transfer_ticket(&ticket.ticket_id, "friend@example.com")
            .unwrap();
        assert_eq!(outcome.rejection(), Some(&RejectReason::MatchNotUpcoming));
    }

    // ==========================================
    // 闸机核验
    // ==========================================

    #[test]
    fn test_gate_scan_twice() {
        let app = TestApp::new();
        let fan = app.spectator("fan@example.com");
        let m = app.upcoming_match(80);
        let ticket = app
            .state
            .ticket_api
            .purchase_tickets(&fan.user_id, &m.match_id, None, TicketCategory::Standard, 1)
            .unwrap()
            .tickets
            .remove(0);

        let first = app.state.ticket_api.validate_at_gate(&ticket.qr_code).unwrap();
        let used = first.accepted().expect("首次核验应成功");
        assert_eq!(used.status, TicketStatus::Used);
        assert!(used.used_at.is_some());

        let second = app.state.ticket_api.validate_at_gate(&ticket.qr_code).unwrap();
        assert_eq!(second.rejection(), Some(&RejectReason::TicketAlreadyUsed));

        let unknown = app.state.ticket_api.validate_at_gate("not-a-qr").unwrap();
        assert_eq!(unknown.rejection(), Some(&RejectReason::UnknownQrCode));
    }

    #[test]
    fn test_old_qr_code_is_unknown_after_transfer() {
        let app = TestApp::new();
        let owner = app.spectator("owner@example.com");
        app.spectator("friend@example.com");
        let m = app.upcoming_match(80);
        let ticket = app
            .state
            .ticket_api
            .purchase_tickets(&owner.user_id, &m.match_id, None, TicketCategory::Standard, 1)
            .unwrap()
            .tickets
            .remove(0);

        let receipt = app
            .state
            .ticket_api
            .transfer_ticket(&ticket.ticket_id, "friend@example.com")
            .unwrap()
            .accepted()
            .unwrap();

        let stale = app.state.ticket_api.validate_at_gate(&ticket.qr_code).unwrap();
        assert_eq!(stale.rejection(), Some(&RejectReason::UnknownQrCode));
        assert!(app
            .state
            .ticket_api
            .validate_at_gate(&receipt.ticket.qr_code)
            .unwrap()
            .is_accepted());
    }

    // ==========================================
    // 退票
    // ==========================================

    #[test]
    fn test_cancel_valid_ticket_refunds_and_releases_seat() {
        let app = TestApp::new();
        let fan = app.spectator("fan@example.com");
        let m = app.upcoming_match(800);
        let north = app.zone(&m.match_id, ZoneType::NorthStand);

        let ticket = app
            .state
            .ticket_api
            .purchase_tickets(&fan.user_id, &m.match_id, Some(&north.zone_id), TicketCategory::Premium, 1)
            .unwrap()
            .tickets
            .remove(0);
        assert_eq!(app.reload_zone(&m.match_id, &north.zone_id).available, 99);
        assert!(app.state.ticket_api.is_refundable(&ticket.ticket_id).unwrap());

        let receipt = app
            .state
            .ticket_api
            .cancel_ticket(&ticket.ticket_id)
            .unwrap()
            .accepted()
            .expect("退票应成功");

        assert_eq!(receipt.ticket.status, TicketStatus::Cancelled);
        assert_eq!(receipt.refund.tx_type, TransactionType::Refund);
        assert!((receipt.refund.amount - ticket.price).abs() < 1e-9);
        assert_eq!(app.reload_zone(&m.match_id, &north.zone_id).available, 100);
        assert_eq!(app.reload_match(&m.match_id).tickets_available, 800);

        let txs = app.state.ticket_api.transactions_of_ticket(&ticket.ticket_id).unwrap();
        let purchase = txs
            .iter()
            .find(|t| t.tx_type == TransactionType::Purchase)
            .unwrap();
        assert_eq!(purchase.status, TransactionStatus::Refunded);
        assert!(txs
            .iter()
            .any(|t| t.tx_type == TransactionType::Refund && t.status == TransactionStatus::Validated));

        assert!(!app.state.ticket_api.is_refundable(&ticket.ticket_id).unwrap());
        let again = app.state.ticket_api.cancel_ticket(&ticket.ticket_id).unwrap();
        assert_eq!(again.rejection(), Some(&RejectReason::AlreadyRefunded));
    }

    #[test]
    fn test_cancel_rejections() {
        let app = TestApp::new();
        let fan = app.spectator("fan@example.com");

        let started = app.match_kicking_off_in(80, Duration::hours(-2));
        let ticket = app
            .state
            .ticket_api
            .purchase_tickets(&fan.user_id, &started.match_id, None, TicketCategory::Standard, 1)
            .unwrap()
            .tickets
            .remove(0);
        assert!(!app.state.ticket_api.is_refundable(&ticket.ticket_id).unwrap());
        assert_eq!(
            app.state.ticket_api.cancel_ticket(&ticket.ticket_id).unwrap().rejection(),
            Some(&RejectReason::MatchNotUpcoming)
        );

        let upcoming = app.upcoming_match(80);
        let used = app
            .state
            .ticket_api
            .purchase_tickets(&fan.user_id, &upcoming.match_id, None, TicketCategory::Standard, 1)
            .unwrap()
            .tickets
            .remove(0);
        app.state.ticket_api.validate_at_gate(&used.qr_code).unwrap();
        assert_eq!(
            app.state.ticket_api.cancel_ticket(&used.ticket_id).unwrap().rejection(),
            Some(&RejectReason::TicketNotValid {
                status: TicketStatus::Used
            })
        );
    }

    // ==========================================
    // 过期扫描
    // ==========================================

    #[test]
    fn test_expiry_sweep_expires_tickets_past_validity() {
        let app = TestApp::new();
        let fan = app.spectator("fan@example.com");
        let old = app.match_kicking_off_in(80, Duration::hours(-48));
        let fresh = app.upcoming_match(80);

        let stale = app
            .state
            .ticket_api
            .purchase_tickets(&fan.user_id, &old.match_id, None, TicketCategory::Standard, 1)
            .unwrap()
            .tickets
            .remove(0);
        app.state
            .ticket_api
            .purchase_tickets(&fan.user_id, &fresh.match_id, None, TicketCategory::Standard, 1)
            .unwrap();

        // 核验前已过有效期
        assert_eq!(
            app.state.ticket_api.validate_at_gate(&stale.qr_code).unwrap().rejection(),
            Some(&RejectReason::TicketExpired)
        );

        assert_eq!(app.state.ticket_api.expire_overdue_tickets().unwrap(), 1);
        let expired = app.state.ticket_api.get_ticket(&stale.ticket_id).unwrap().unwrap();
        assert_eq!(expired.status, TicketStatus::Expired);
        assert_eq!(app.state.ticket_api.expire_overdue_tickets().unwrap(), 0);

        let mine = app.state.ticket_api.tickets_of_spectator(&fan.user_id).unwrap();
        assert_eq!(mine.len(), 2);
        assert_eq!(
            mine.iter().filter(|t| t.status == TicketStatus::Valid).count(),
            1
        );
    }

    #[test]
    fn test_ticket_lookup_by_number() {
        let app = TestApp::new();
        let fan = app.spectator("fan@example.com");
        let m = app.upcoming_match(80);
        let ticket = app
            .state
            .ticket_api
            .purchase_tickets(&fan.user_id, &m.match_id, None, TicketCategory::Student, 1)
            .unwrap()
            .tickets
            .remove(0);

        assert!(ticket.ticket_number.starts_with("WC2030-"));
        let found = app
            .state
            .ticket_api
            .ticket_by_number(&ticket.ticket_number)
            .unwrap()
            .unwrap();
        assert_eq!(found.ticket_id, ticket.ticket_id);
        assert!(app.state.ticket_api.ticket_by_number(" ").is_err());
    }
}
