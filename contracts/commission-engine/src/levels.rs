use crate::graph::SponsorGraphModule;
use crate::helpers::get_user;
use crate::interface::LevelOperations;
use crate::types::{DataKey, Error, LevelStep, LevelUnlockSteps, UnlockedLevels, UserData};
use soroban_sdk::{Address, Env, Vec};

/// Which cascade an unlock lookup is for
pub enum UnlockTable {
    RoiOnRoi,
    LevelIncome,
}

pub struct LevelUnlockModule;

impl LevelOperations for LevelUnlockModule {
    fn get_unlocked_levels(env: Env, user: Address) -> Result<UnlockedLevels, Error> {
        let user_data = get_user(&env, &user)?;
        Ok(UnlockedLevels {
            roi_on_roi: Self::unlocked_levels(&env, &user_data, UnlockTable::RoiOnRoi),
            level_income: Self::unlocked_levels(&env, &user_data, UnlockTable::LevelIncome),
        })
    }
}

// Helper functions
impl LevelUnlockModule {
    /// Unlocked depth for one cascade, derived from the live active-direct
    /// count at call time. Zero directs unlock nothing; missing step tables
    /// unlock nothing.
    pub fn unlocked_levels(env: &Env, user_data: &UserData, table: UnlockTable) -> u32 {
        let steps: LevelUnlockSteps = match env.storage().instance().get(&DataKey::LevelUnlockSteps)
        {
            Some(steps) => steps,
            None => return 0,
        };
        let steps: Vec<LevelStep> = match table {
            UnlockTable::RoiOnRoi => steps.roi_on_roi,
            UnlockTable::LevelIncome => steps.level_income,
        };

        let directs = SponsorGraphModule::directs_with_active_package(env, user_data);
        let mut unlocked = 0u32;
        for step in steps.iter() {
            if directs >= step.min_directs {
                unlocked = step.unlocked_levels;
            } else {
                break;
            }
        }
        unlocked
    }
}
