// ==========================================
// 世界杯票务系统 - 区域座位库存引擎
// ==========================================
// 扣减在 0 处、释放在容量处不变（条件 UPDATE 保证）
// ==========================================

use crate::domain::zone::SeatInventory;
use crate::repository::error::RepositoryResult;
use crate::repository::inventory_repo::InventoryRepository;
use crate::repository::zone_repo::ZoneRepository;
use std::sync::Arc;

pub struct ZoneInventory {
    inventory_repo: Arc<InventoryRepository>,
    zone_repo: Arc<ZoneRepository>,
}

impl ZoneInventory {
    pub fn new(inventory_repo: Arc<InventoryRepository>, zone_repo: Arc<ZoneRepository>) -> Self {
        Self {
            inventory_repo,
            zone_repo,
        }
    }

    /// 占用一个座位；已满时返回 false
    pub fn decrement(&self, zone_id: &str) -> RepositoryResult<bool> {
        let taken = self.inventory_repo.try_decrement_zone(zone_id)?;
        if !taken {
            tracing::debug!(zone_id, "区域无余座，扣减忽略");
        }
        Ok(taken)
    }

    /// 释放一个座位；已满容量时返回 false
    pub fn increment(&self, zone_id: &str) -> RepositoryResult<bool> {
        let released = self.inventory_repo.increment_zone(zone_id)?;
        if !released {
            tracing::debug!(zone_id, "区域座位已满容量，释放忽略");
        }
        Ok(released)
    }

    pub fn decrement_match(&self, match_id: &str) -> RepositoryResult<bool> {
        self.inventory_repo.try_decrement_match(match_id)
    }

    pub fn increment_match(&self, match_id: &str) -> RepositoryResult<bool> {
        self.inventory_repo.increment_match(match_id)
    }

    /// 区域上座率 (%)；区域不存在时返回 None
    pub fn occupancy_rate(&self, zone_id: &str) -> RepositoryResult<Option<f64>> {
        Ok(self
            .zone_repo
            .find_by_id(zone_id)?
            .map(|zone| zone.occupancy_rate()))
    }

    /// 比赛各区域上座率 (zone_name, rate)
    pub fn match_occupancy(&self, match_id: &str) -> RepositoryResult<Vec<(String, f64)>> {
        Ok(self
            .zone_repo
            .list_by_match(match_id)?
            .into_iter()
            .map(|zone| {
                let rate = zone.occupancy_rate();
                (zone.name, rate)
            })
            .collect())
    }
}
