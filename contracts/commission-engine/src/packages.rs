use crate::admin::AdminModule;
use crate::booster::BoosterModule;
use crate::graph::SponsorGraphModule;
use crate::helpers::{
    add_total_distributed, apply_bps, ensure_engine_active, get_user, record_commission,
    record_payout, record_transaction, save_user, DAY_SECS,
};
use crate::interface::PackageOperations;
use crate::levels::{LevelUnlockModule, UnlockTable};
use crate::types::{
    Booster, BoosterStatus, Commission, DataKey, Error, Feature, Package, PackageStatus, Payout,
    PlanConfig, Transaction, TransactionKind, UserData,
};
use soroban_sdk::token::TokenClient;
use soroban_sdk::{Address, Env, Symbol, Vec};

pub struct PackageModule;

impl PackageOperations for PackageModule {
    fn purchase_package(env: Env, user: Address, amount: i128) -> Result<u64, Error> {
        ensure_engine_active(&env)?;
        user.require_auth();

        if !AdminModule::feature_enabled(&env, Feature::Roi) {
            return Err(Error::FeatureDisabled);
        }
        let mut user_data = get_user(&env, &user)?;

        let plan: PlanConfig = env
            .storage()
            .instance()
            .get(&DataKey::PlanConfig)
            .ok_or(Error::ConfigMissing)?;
        if amount <= 0 {
            return Err(Error::InvalidAmount);
        }
        if amount < plan.min_amount {
            return Err(Error::AmountBelowMinimum);
        }
        if amount > plan.max_amount {
            return Err(Error::AmountAboveMaximum);
        }
        if amount % plan.base_amount != 0 {
            return Err(Error::AmountNotMultiple);
        }

        // Principal moves into contract custody up front.
        let payout_token: Address = env
            .storage()
            .instance()
            .get(&DataKey::PayoutToken)
            .ok_or(Error::NotInitialized)?;
        let token = TokenClient::new(&env, &payout_token);
        token.transfer(&user, &env.current_contract_address(), &amount);

        let now = env.ledger().timestamp();
        let id = env
            .storage()
            .instance()
            .get::<_, u64>(&DataKey::PackageCounter)
            .unwrap_or(0)
            + 1;
        env.storage().instance().set(&DataKey::PackageCounter, &id);

        // A package bought while the owner's booster is already achieved
        // earns the bonus from day one.
        let achieved_bonus_bps = env
            .storage()
            .persistent()
            .get::<_, Booster>(&DataKey::Booster(user.clone()))
            .filter(|booster| booster.status == BoosterStatus::Achieved)
            .map(|booster| booster.bonus_roi_bps);

        let package = Package {
            id,
            owner: user.clone(),
            principal: amount,
            daily_roi_amount: apply_bps(amount, plan.daily_roi_bps),
            total_roi_earned: 0,
            total_roi_limit: apply_bps(amount, plan.max_return_bps),
            has_booster: achieved_bonus_bps.is_some(),
            booster_roi_bps: achieved_bonus_bps.unwrap_or(0),
            status: PackageStatus::Active,
            created_at: now,
            expiry_date: now + plan.duration_days * DAY_SECS,
        };
        env.storage().persistent().set(&DataKey::Package(id), &package);

        let mut owned = env
            .storage()
            .persistent()
            .get::<_, Vec<u64>>(&DataKey::UserPackages(user.clone()))
            .unwrap_or_else(|| Vec::new(&env));
        owned.push_back(id);
        env.storage()
            .persistent()
            .set(&DataKey::UserPackages(user.clone()), &owned);

        let mut active = env
            .storage()
            .persistent()
            .get::<_, Vec<u64>>(&DataKey::ActivePackages)
            .unwrap_or_else(|| Vec::new(&env));
        active.push_back(id);
        env.storage()
            .persistent()
            .set(&DataKey::ActivePackages, &active);

        if user_data.first_investment_date == 0 {
            user_data.first_investment_date = now;
        }
        user_data.total_investment += amount;
        user_data.is_active = true;
        save_user(&env, &user_data);

        BoosterModule::initialize_booster(&env, &user);
        if let Some(sponsor) = user_data.sponsor.clone() {
            BoosterModule::update_direct_count(&env, &sponsor);
        }

        if AdminModule::feature_enabled(&env, Feature::Binary) {
            SponsorGraphModule::add_binary_volume(&env, &user, amount);
        }

        Self::distribute_level_income(&env, &user_data, amount);

        env.events()
            .publish((Symbol::new(&env, "package_purchased"), user), (id, amount));
        Ok(id)
    }

    fn get_package(env: Env, package_id: u64) -> Result<Package, Error> {
        env.storage()
            .persistent()
            .get(&DataKey::Package(package_id))
            .ok_or(Error::PackageNotFound)
    }

    fn get_user_packages(env: Env, user: Address) -> Result<Vec<u64>, Error> {
        Ok(env
            .storage()
            .persistent()
            .get(&DataKey::UserPackages(user))
            .unwrap_or_else(|| Vec::new(&env)))
    }
}

// Helper functions
impl PackageModule {
    /// Mark a package completed and drop it from the active set. The owner
    /// stays active only while another of their packages still is.
    pub fn complete_package(env: &Env, package: &mut Package) {
        package.status = PackageStatus::Completed;
        env.storage()
            .persistent()
            .set(&DataKey::Package(package.id), package);

        let active = env
            .storage()
            .persistent()
            .get::<_, Vec<u64>>(&DataKey::ActivePackages)
            .unwrap_or_else(|| Vec::new(env));
        let mut remaining = Vec::new(env);
        for id in active.iter() {
            if id != package.id {
                remaining.push_back(id);
            }
        }
        env.storage()
            .persistent()
            .set(&DataKey::ActivePackages, &remaining);

        Self::refresh_activity(env, &package.owner);
    }

    fn refresh_activity(env: &Env, owner: &Address) {
        let owned = env
            .storage()
            .persistent()
            .get::<_, Vec<u64>>(&DataKey::UserPackages(owner.clone()))
            .unwrap_or_else(|| Vec::new(env));
        let mut any_active = false;
        for id in owned.iter() {
            if let Some(package) = env
                .storage()
                .persistent()
                .get::<_, Package>(&DataKey::Package(id))
            {
                if package.status == PackageStatus::Active {
                    any_active = true;
                    break;
                }
            }
        }
        if let Ok(mut owner_data) = get_user(env, owner) {
            if owner_data.is_active != any_active {
                owner_data.is_active = any_active;
                save_user(env, &owner_data);
            }
        }
    }

    /// Purchase-time cascade: each ancestor's share of the new principal,
    /// gated by that ancestor's unlocked level-income depth. A locked or
    /// missing ancestor consumes its level slot. Returns the total paid.
    fn distribute_level_income(env: &Env, buyer: &UserData, principal: i128) -> i128 {
        if !AdminModule::feature_enabled(env, Feature::LevelIncome) {
            return 0;
        }
        let rates: Vec<u32> = match env.storage().instance().get(&DataKey::LevelIncomeRates) {
            Some(rates) => rates,
            None => return 0,
        };

        let now = env.ledger().timestamp();
        let mut total = 0i128;
        for (ancestor, level) in SponsorGraphModule::upline_chain(env, buyer).iter() {
            if level > rates.len() {
                break;
            }
            let mut ancestor_data = match get_user(env, &ancestor) {
                Ok(data) => data,
                Err(_) => continue,
            };
            let unlocked =
                LevelUnlockModule::unlocked_levels(env, &ancestor_data, UnlockTable::LevelIncome);
            if level > unlocked {
                continue;
            }
            let share = apply_bps(principal, rates.get(level - 1).unwrap_or(0));
            if share <= 0 {
                continue;
            }

            ancestor_data.wallet_balance += share;
            ancestor_data.earnings.commission += share;
            save_user(env, &ancestor_data);

            record_payout(
                env,
                &ancestor,
                Payout {
                    source: buyer.address.clone(),
                    amount: share,
                    level,
                    timestamp: now,
                },
            );
            record_commission(
                env,
                &ancestor,
                Commission {
                    source: buyer.address.clone(),
                    amount: share,
                    level,
                    kind: TransactionKind::LevelIncome,
                    timestamp: now,
                },
            );
            record_transaction(
                env,
                &ancestor,
                Transaction {
                    kind: TransactionKind::LevelIncome,
                    amount: share,
                    counterparty: Some(buyer.address.clone()),
                    level,
                    timestamp: now,
                },
            );
            total += share;
        }

        if total > 0 {
            add_total_distributed(env, total);
        }
        total
    }
}
