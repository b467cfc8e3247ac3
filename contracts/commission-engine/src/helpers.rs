use crate::admin::AdminModule;
use crate::types::{Commission, DataKey, Error, Payout, Transaction, UserData};
use soroban_sdk::{Address, Env, Vec};

pub const DAY_SECS: u64 = 24 * 60 * 60;
pub const WEEK_SECS: u64 = 7 * DAY_SECS;
pub const MONTH_SECS: u64 = 30 * DAY_SECS;

/// Traversal ceiling for both sponsor-chain and placement-tree walks.
/// Guards against cycles introduced by upstream placement bugs.
pub const MAX_TREE_DEPTH: u32 = 30;

pub fn get_user(env: &Env, user: &Address) -> Result<UserData, Error> {
    env.storage()
        .persistent()
        .get(&DataKey::User(user.clone()))
        .ok_or(Error::UserNotFound)
}

pub fn user_exists(env: &Env, user: &Address) -> bool {
    env.storage().persistent().has(&DataKey::User(user.clone()))
}

pub fn save_user(env: &Env, user_data: &UserData) {
    env.storage()
        .persistent()
        .set(&DataKey::User(user_data.address.clone()), user_data);
}

pub fn verify_admin(env: &Env) -> Result<(), Error> {
    let admin: Address = env
        .storage()
        .instance()
        .get(&DataKey::Admin)
        .ok_or(Error::NotInitialized)?;
    admin.require_auth();
    Ok(())
}

pub fn ensure_engine_active(env: &Env) -> Result<(), Error> {
    if AdminModule::is_engine_paused(env) {
        return Err(Error::EnginePaused);
    }
    Ok(())
}

/// Apply a basis-point rate to an amount, truncating toward zero.
pub fn apply_bps(amount: i128, bps: u32) -> i128 {
    amount * bps as i128 / 10_000
}

pub fn day_index(timestamp: u64) -> u64 {
    timestamp / DAY_SECS
}

pub fn week_index(timestamp: u64) -> u64 {
    timestamp / WEEK_SECS
}

pub fn month_index(timestamp: u64) -> u64 {
    timestamp / MONTH_SECS
}

/// Days since 1970-01-01 for a civil date. Valid for all post-epoch dates
/// this contract can observe.
fn days_from_civil(year: i64, month: i64, day: i64) -> i64 {
    let y = if month <= 2 { year - 1 } else { year };
    let era = if y >= 0 { y } else { y - 399 } / 400;
    let yoe = y - era * 400;
    let mp = (month + 9) % 12;
    let doy = (153 * mp + 2) / 5 + day - 1;
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;
    era * 146097 + doe - 719468
}

/// Timestamp bounds [start, end) of a calendar month.
pub fn month_bounds(month: u32, year: u32) -> Result<(u64, u64), Error> {
    if !(1..=12).contains(&month) {
        return Err(Error::InvalidPeriod);
    }
    let start = days_from_civil(year as i64, month as i64, 1) as u64 * DAY_SECS;
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    let end = days_from_civil(next_year as i64, next_month as i64, 1) as u64 * DAY_SECS;
    Ok((start, end))
}

pub fn record_transaction(env: &Env, user: &Address, entry: Transaction) {
    let key = DataKey::Transactions(user.clone());
    let mut entries = env
        .storage()
        .persistent()
        .get::<_, Vec<Transaction>>(&key)
        .unwrap_or_else(|| Vec::new(env));
    entries.push_back(entry);
    env.storage().persistent().set(&key, &entries);
}

pub fn record_payout(env: &Env, user: &Address, entry: Payout) {
    let key = DataKey::Payouts(user.clone());
    let mut entries = env
        .storage()
        .persistent()
        .get::<_, Vec<Payout>>(&key)
        .unwrap_or_else(|| Vec::new(env));
    entries.push_back(entry);
    env.storage().persistent().set(&key, &entries);
}

pub fn record_commission(env: &Env, user: &Address, entry: Commission) {
    let key = DataKey::Commissions(user.clone());
    let mut entries = env
        .storage()
        .persistent()
        .get::<_, Vec<Commission>>(&key)
        .unwrap_or_else(|| Vec::new(env));
    entries.push_back(entry);
    env.storage().persistent().set(&key, &entries);
}

pub fn add_total_distributed(env: &Env, amount: i128) {
    let current = env
        .storage()
        .persistent()
        .get::<_, i128>(&DataKey::TotalDistributed)
        .unwrap_or(0);
    env.storage()
        .persistent()
        .set(&DataKey::TotalDistributed, &(current + amount));
}
