// ==========================================
// 并发购票测试
// ==========================================
// 职责: 多线程同时抢购时不超卖，计数保持在 [0, capacity]
// ==========================================

mod helpers;

#[cfg(test)]
mod concurrent_purchase_test {
    use std::sync::Arc;
    use std::thread;

    use worldcup_ticketing::domain::{RejectReason, TicketCategory, ZoneType};

    use crate::helpers::test_app::TestApp;

    #[test]
    fn test_concurrent_zone_purchases_never_oversell() {
        let app = TestApp::new();
        let m = app.upcoming_match(160);
        let vip = app.zone(&m.match_id, ZoneType::Vip);
        assert_eq!(vip.capacity, 5);

        let buyers: Vec<String> = (0..12)
            .map(|i| app.spectator(&format!("fan{}@example.com", i)).user_id)
            .collect();

        let handles: Vec<_> = buyers
            .into_iter()
            .map(|buyer| {
                let api = Arc::clone(&app.state.ticket_api);
                let match_id = m.match_id.clone();
                let zone_id = vip.zone_id.clone();
                thread::spawn(move || {
                    api.purchase_tickets(&buyer, &match_id, Some(&zone_id), TicketCategory::Vip, 1)
                        .unwrap()
                })
            })
            .collect();

        let reports: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let sold: usize = reports.iter().map(|r| r.purchased_count()).sum();
        assert_eq!(sold, 5);
        assert!(reports
            .iter()
            .flat_map(|r| r.rejections.iter())
            .all(RejectReason::is_capacity_exhausted));

        let vip = app.reload_zone(&m.match_id, &vip.zone_id);
        assert_eq!(vip.available, 0);
        assert_eq!(app.reload_match(&m.match_id).tickets_available, 155);
        assert_eq!(
            app.state.ticket_api.tickets_of_match(&m.match_id).unwrap().len(),
            5
        );
    }

    #[test]
    fn test_concurrent_match_purchases_stop_at_capacity() {
        let app = TestApp::new();
        let m = app.upcoming_match(10);
        let fan = app.spectator("fan@example.com");

        let handles: Vec<_> = (0..6)
            .map(|_| {
                let api = Arc::clone(&app.state.ticket_api);
                let match_id = m.match_id.clone();
                let buyer = fan.user_id.clone();
                thread::spawn(move || {
                    api.purchase_tickets(&buyer, &match_id, None, TicketCategory::Standard, 3)
                        .unwrap()
                })
            })
            .collect();

        let sold: usize = handles
            .into_iter()
            .map(|h| h.join().unwrap().purchased_count())
            .sum();
        assert_eq!(sold, 10);

        let reloaded = app.reload_match(&m.match_id);
        assert_eq!(reloaded.tickets_available, 0);
        assert!(reloaded.is_sold_out());

        let stats = app.state.match_api.match_stats(&m.match_id).unwrap();
        assert_eq!(stats.tickets_sold, 10);
        assert!((stats.revenue - 1000.0).abs() < 1e-9);
        assert!((stats.fill_rate - 100.0).abs() < 1e-9);
    }
}
