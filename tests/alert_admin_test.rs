// ==========================================
// 告警管理集成测试
// ==========================================
// 覆盖: 上座率巡检阈值、告警查询、管理员处理权限
// ==========================================

mod helpers;

#[cfg(test)]
mod alert_admin_test {
    use worldcup_ticketing::api::ApiError;
    use worldcup_ticketing::domain::{AlertLevel, TicketCategory, ZoneType};

    use crate::helpers::test_app::TestApp;

    /// VIP 区 20 座（容量 640），售出 sold 张后巡检
    fn sweep_after_selling(sold: u32) -> (TestApp, String) {
        let app = TestApp::new();
        let fan = app.spectator("fan@example.com");
        let m = app.upcoming_match(640);
        let vip = app.zone(&m.match_id, ZoneType::Vip);
        assert_eq!(vip.capacity, 20);

        let report = app
            .state
            .ticket_api
            .purchase_tickets(&fan.user_id, &m.match_id, Some(&vip.zone_id), TicketCategory::Standard, sold)
            .unwrap();
        assert_eq!(report.purchased_count(), sold as usize);

        app.state.flow_api.sweep(&m.match_id).unwrap();
        (app, m.match_id)
    }

    #[test]
    fn test_occupancy_sweep_levels() {
        // 80% → MEDIUM
        let (app, match_id) = sweep_after_selling(16);
        let alerts = app.state.alert_api.list_by_match(&match_id).unwrap();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].level, AlertLevel::Medium);
        assert!(app.state.alert_api.list_critical().unwrap().is_empty());

        // 90% → HIGH
        let (app, match_id) = sweep_after_selling(18);
        let alerts = app.state.alert_api.list_by_match(&match_id).unwrap();
        assert_eq!(alerts[0].level, AlertLevel::High);
        assert_eq!(app.state.alert_api.list_critical().unwrap().len(), 1);

        // 100% → CRITICAL
        let (app, match_id) = sweep_after_selling(20);
        let alerts = app.state.alert_api.list_by_match(&match_id).unwrap();
        assert_eq!(alerts[0].level, AlertLevel::Critical);
        assert_eq!(alerts[0].source.as_deref(), Some("occupancy_sweep"));

        // 75% 不触发（严格大于）
        let (app, match_id) = sweep_after_selling(15);
        assert!(app.state.alert_api.list_by_match(&match_id).unwrap().is_empty());
    }

    #[test]
    fn test_alert_queries() {
        let (app, match_id) = sweep_after_selling(20);
        let api = &app.state.alert_api;
        let alert = api.list_by_match(&match_id).unwrap().remove(0);

        assert_eq!(api.count_active().unwrap(), 1);
        assert_eq!(api.list_active().unwrap().len(), 1);
        assert_eq!(
            api.list_by_zone(alert.zone_id.as_deref().unwrap()).unwrap().len(),
            1
        );
        assert_eq!(api.latest(10).unwrap().len(), 1);
        assert!(matches!(api.latest(0), Err(ApiError::InvalidInput(_))));
    }

    #[test]
    fn test_resolve_requires_alert_permission() {
        let (app, match_id) = sweep_after_selling(20);
        let api = &app.state.alert_api;
        let alert = api.list_by_match(&match_id).unwrap().remove(0);

        let viewer = app.admin("ops@example.com", true);
        let clerk = app.admin("clerk@example.com", false);
        let fan = app.state.user_api.find_by_email("fan@example.com").unwrap().unwrap();

        assert!(matches!(
            api.resolve_alert(&alert.alert_id, &clerk.user_id, None),
            Err(ApiError::PermissionDenied(_))
        ));
        assert!(matches!(
            api.resolve_alert(&alert.alert_id, &fan.user_id, None),
            Err(ApiError::PermissionDenied(_))
        ));

        let resolved = api
            .resolve_alert(&alert.alert_id, &viewer.user_id, Some("已增派安保"))
            .unwrap();
        assert!(resolved.resolved);
        assert_eq!(resolved.resolved_by.as_deref(), Some(viewer.user_id.as_str()));
        assert_eq!(resolved.resolution_comment.as_deref(), Some("已增派安保"));
        assert!(resolved.resolved_at.is_some());

        assert_eq!(api.count_active().unwrap(), 0);
        assert!(api.list_critical().unwrap().is_empty());
        assert!(matches!(
            api.resolve_alert(&alert.alert_id, &viewer.user_id, None),
            Err(ApiError::BusinessRuleViolation(_))
        ));
        assert!(matches!(
            api.resolve_alert("missing", &viewer.user_id, None),
            Err(ApiError::NotFound(_))
        ));
    }

    #[test]
    fn test_inactive_admin_cannot_resolve() {
        let (app, match_id) = sweep_after_selling(20);
        let alert = app.state.alert_api.list_by_match(&match_id).unwrap().remove(0);
        let admin = app.admin("ops@example.com", true);
        assert!(app.state.user_api.set_active(&admin.user_id, false).unwrap());

        assert!(matches!(
            app.state.alert_api.resolve_alert(&alert.alert_id, &admin.user_id, None),
            Err(ApiError::PermissionDenied(_))
        ));
    }
}
