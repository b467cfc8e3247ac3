use crate::admin::AdminModule;
use crate::graph::SponsorGraphModule;
use crate::helpers::{get_user, verify_admin, DAY_SECS};
use crate::interface::BoosterOperations;
use crate::types::{
    Booster, BoosterConfig, BoosterStatus, DataKey, Error, Feature, Package, PackageStatus,
};
use soroban_sdk::{Address, Env, Symbol, Vec};

pub struct BoosterModule;

impl BoosterOperations for BoosterModule {
    fn get_booster(env: Env, user: Address) -> Result<Booster, Error> {
        env.storage()
            .persistent()
            .get(&DataKey::Booster(user))
            .ok_or(Error::BoosterNotFound)
    }

    fn refresh_booster_directs(env: Env, user: Address) -> Result<(), Error> {
        get_user(&env, &user)?;
        Self::update_direct_count(&env, &user);
        Ok(())
    }

    fn expire_boosters(env: Env) -> Result<u32, Error> {
        verify_admin(&env)?;
        let now = env.ledger().timestamp();
        let members = env
            .storage()
            .persistent()
            .get::<_, Vec<Address>>(&DataKey::BoosterMembers)
            .unwrap_or_else(|| Vec::new(&env));

        let mut expired = 0u32;
        for owner in members.iter() {
            let mut booster: Booster = match env
                .storage()
                .persistent()
                .get(&DataKey::Booster(owner.clone()))
            {
                Some(booster) => booster,
                None => continue,
            };
            if booster.status != BoosterStatus::Active || now <= booster.end_date {
                continue;
            }

            booster.status = BoosterStatus::Expired;
            env.storage()
                .persistent()
                .set(&DataKey::Booster(owner.clone()), &booster);

            // No further bonus from here on; already-credited bonus stays.
            Self::strip_package_flags(&env, &owner);
            expired += 1;
            env.events()
                .publish((Symbol::new(&env, "booster_expired"), owner), ());
        }
        Ok(expired)
    }
}

// Helper functions
impl BoosterModule {
    /// Start the countdown on a member's first investment. No-op when the
    /// feature is off or an active/achieved booster already exists; an
    /// expired booster may be replaced by a fresh window.
    pub fn initialize_booster(env: &Env, user: &Address) {
        if !AdminModule::feature_enabled(env, Feature::Booster) {
            return;
        }
        if let Some(existing) = env
            .storage()
            .persistent()
            .get::<_, Booster>(&DataKey::Booster(user.clone()))
        {
            if existing.status != BoosterStatus::Expired {
                return;
            }
        }
        let config: BoosterConfig = match env.storage().instance().get(&DataKey::BoosterConfig) {
            Some(config) => config,
            None => return,
        };

        let now = env.ledger().timestamp();
        let booster = Booster {
            owner: user.clone(),
            start_date: now,
            end_date: now + config.countdown_days * DAY_SECS,
            direct_count: 0,
            target_directs: config.target_directs,
            bonus_roi_bps: config.bonus_roi_bps,
            status: BoosterStatus::Active,
        };
        let is_new = !env
            .storage()
            .persistent()
            .has(&DataKey::Booster(user.clone()));
        env.storage()
            .persistent()
            .set(&DataKey::Booster(user.clone()), &booster);

        if is_new {
            let mut members = env
                .storage()
                .persistent()
                .get::<_, Vec<Address>>(&DataKey::BoosterMembers)
                .unwrap_or_else(|| Vec::new(env));
            members.push_back(user.clone());
            env.storage()
                .persistent()
                .set(&DataKey::BoosterMembers, &members);
        }
        env.events().publish(
            (Symbol::new(env, "booster_started"), user.clone()),
            booster.end_date,
        );
    }

    /// Recompute the cached active-direct count and transition to Achieved
    /// when the target is met inside the window. Achieved is one-way: a
    /// later drop in directs never revokes it.
    pub fn update_direct_count(env: &Env, user: &Address) {
        let mut booster: Booster = match env
            .storage()
            .persistent()
            .get(&DataKey::Booster(user.clone()))
        {
            Some(booster) => booster,
            None => return,
        };

        let user_data = match get_user(env, user) {
            Ok(data) => data,
            Err(_) => return,
        };
        let count = SponsorGraphModule::directs_with_active_package(env, &user_data);
        booster.direct_count = count;

        let now = env.ledger().timestamp();
        if booster.status == BoosterStatus::Active
            && count >= booster.target_directs
            && now <= booster.end_date
        {
            booster.status = BoosterStatus::Achieved;
            Self::apply_bonus_to_packages(env, user, booster.bonus_roi_bps);
            env.events()
                .publish((Symbol::new(env, "booster_achieved"), user.clone()), count);
        }

        env.storage()
            .persistent()
            .set(&DataKey::Booster(user.clone()), &booster);
    }

    /// True when the member holds an achieved booster. The bonus persists
    /// for the remaining life of flagged packages regardless of end_date.
    pub fn has_achieved_booster(env: &Env, user: &Address) -> bool {
        env.storage()
            .persistent()
            .get::<_, Booster>(&DataKey::Booster(user.clone()))
            .map_or(false, |booster| booster.status == BoosterStatus::Achieved)
    }

    fn apply_bonus_to_packages(env: &Env, owner: &Address, bonus_roi_bps: u32) {
        let package_ids = env
            .storage()
            .persistent()
            .get::<_, Vec<u64>>(&DataKey::UserPackages(owner.clone()))
            .unwrap_or_else(|| Vec::new(env));
        for id in package_ids.iter() {
            let mut package: Package = match env.storage().persistent().get(&DataKey::Package(id)) {
                Some(package) => package,
                None => continue,
            };
            if package.status != PackageStatus::Active {
                continue;
            }
            package.has_booster = true;
            package.booster_roi_bps = bonus_roi_bps;
            env.storage().persistent().set(&DataKey::Package(id), &package);
        }
    }

    fn strip_package_flags(env: &Env, owner: &Address) {
        let package_ids = env
            .storage()
            .persistent()
            .get::<_, Vec<u64>>(&DataKey::UserPackages(owner.clone()))
            .unwrap_or_else(|| Vec::new(env));
        for id in package_ids.iter() {
            let mut package: Package = match env.storage().persistent().get(&DataKey::Package(id)) {
                Some(package) => package,
                None => continue,
            };
            if package.has_booster {
                package.has_booster = false;
                package.booster_roi_bps = 0;
                env.storage().persistent().set(&DataKey::Package(id), &package);
            }
        }
    }
}
