use crate::helpers::{ensure_engine_active, get_user, save_user, user_exists, verify_admin, MAX_TREE_DEPTH};
use crate::interface::GraphOperations;
use crate::types::{BinaryNode, DataKey, Earnings, Error, Leg, UserData};
use soroban_sdk::{Address, Env, Map, Symbol, Vec};

pub struct SponsorGraphModule;

impl GraphOperations for SponsorGraphModule {
    fn register_user(env: Env, user: Address, sponsor: Address) -> Result<(), Error> {
        ensure_engine_active(&env)?;
        user.require_auth();

        if user == sponsor {
            return Err(Error::SelfSponsorship);
        }
        if user_exists(&env, &user) {
            return Err(Error::AlreadyRegistered);
        }
        if !user_exists(&env, &sponsor) {
            return Err(Error::SponsorNotFound);
        }

        let user_data = UserData {
            address: user.clone(),
            sponsor: Some(sponsor.clone()),
            direct_referrals: Vec::new(&env),
            wallet_balance: 0,
            total_investment: 0,
            total_withdrawal: 0,
            earnings: Earnings {
                roi: 0,
                commission: 0,
                binary: 0,
                booster: 0,
                roi_on_roi: 0,
                reward: 0,
            },
            is_active: false,
            first_investment_date: 0,
            rank: 0,
            joined_at: env.ledger().timestamp(),
        };
        save_user(&env, &user_data);

        let mut sponsor_data = get_user(&env, &sponsor)?;
        sponsor_data.direct_referrals.push_back(user.clone());
        save_user(&env, &sponsor_data);

        let mut all_users = env
            .storage()
            .persistent()
            .get::<_, Vec<Address>>(&DataKey::AllUsers)
            .unwrap_or_else(|| Vec::new(&env));
        all_users.push_back(user.clone());
        env.storage().persistent().set(&DataKey::AllUsers, &all_users);

        let total = env
            .storage()
            .persistent()
            .get::<_, u32>(&DataKey::TotalUsers)
            .unwrap_or(0);
        env.storage().persistent().set(&DataKey::TotalUsers, &(total + 1));

        env.events()
            .publish((Symbol::new(&env, "user_registered"), user), sponsor);
        Ok(())
    }

    fn get_user_info(env: Env, user: Address) -> Result<UserData, Error> {
        get_user(&env, &user)
    }

    fn get_upline_chain(env: Env, user: Address) -> Result<Vec<(Address, u32)>, Error> {
        let user_data = get_user(&env, &user)?;
        Ok(Self::upline_chain(&env, &user_data))
    }

    fn get_directs_with_active_package(env: Env, user: Address) -> Result<u32, Error> {
        let user_data = get_user(&env, &user)?;
        Ok(Self::directs_with_active_package(&env, &user_data))
    }

    fn get_all_downline(env: Env, user: Address) -> Result<Vec<Address>, Error> {
        get_user(&env, &user)?;
        Ok(Self::all_downline(&env, &user))
    }

    fn place_binary(env: Env, user: Address, parent: Address, position: Leg) -> Result<(), Error> {
        ensure_engine_active(&env)?;
        verify_admin(&env)?;

        if user == parent {
            return Err(Error::PlacementCycle);
        }
        get_user(&env, &user)?;
        get_user(&env, &parent)?;

        let mut user_node = Self::get_or_new_node(&env, &user);
        if user_node.parent.is_some() {
            return Err(Error::AlreadyPlaced);
        }

        let mut parent_node = Self::get_or_new_node(&env, &parent);
        let occupied = match position {
            Leg::Left => parent_node.left_child.is_some(),
            Leg::Right => parent_node.right_child.is_some(),
        };
        if occupied {
            return Err(Error::PositionOccupied);
        }

        // The candidate parent must not sit anywhere below the user.
        let mut cursor = parent.clone();
        let mut depth = 0u32;
        loop {
            let node: BinaryNode = match env
                .storage()
                .persistent()
                .get(&DataKey::BinaryNode(cursor.clone()))
            {
                Some(node) => node,
                None => break,
            };
            match node.parent {
                Some(ancestor) => {
                    if ancestor == user {
                        return Err(Error::PlacementCycle);
                    }
                    cursor = ancestor;
                }
                None => break,
            }
            depth += 1;
            if depth >= MAX_TREE_DEPTH {
                break;
            }
        }

        user_node.parent = Some(parent.clone());
        user_node.position = Some(position);
        match position {
            Leg::Left => parent_node.left_child = Some(user.clone()),
            Leg::Right => parent_node.right_child = Some(user.clone()),
        }
        Self::save_node(&env, &user, &user_node);
        Self::save_node(&env, &parent, &parent_node);

        env.events()
            .publish((Symbol::new(&env, "binary_placed"), user), parent);
        Ok(())
    }

    fn get_binary_node(env: Env, user: Address) -> Result<BinaryNode, Error> {
        env.storage()
            .persistent()
            .get(&DataKey::BinaryNode(user))
            .ok_or(Error::BinaryNodeNotFound)
    }
}

// Helper functions
impl SponsorGraphModule {
    /// Ordered ancestors of a member, depth starting at 1 for the direct
    /// sponsor. Bounded by MAX_TREE_DEPTH and a visited set: sponsor data
    /// should be acyclic, but the walk must survive it not being so.
    pub fn upline_chain(env: &Env, user_data: &UserData) -> Vec<(Address, u32)> {
        let mut chain = Vec::new(env);
        let mut visited: Map<Address, bool> = Map::new(env);
        visited.set(user_data.address.clone(), true);

        let mut cursor = user_data.sponsor.clone();
        let mut depth = 1u32;
        while let Some(ancestor) = cursor {
            if depth > MAX_TREE_DEPTH || visited.contains_key(ancestor.clone()) {
                break;
            }
            let ancestor_data = match get_user(env, &ancestor) {
                Ok(data) => data,
                Err(_) => break,
            };
            chain.push_back((ancestor.clone(), depth));
            visited.set(ancestor, true);
            cursor = ancestor_data.sponsor;
            depth += 1;
        }
        chain
    }

    /// Directs holding at least one active package. Always recomputed from
    /// live records so a direct dropping out is seen on the next read.
    pub fn directs_with_active_package(env: &Env, user_data: &UserData) -> u32 {
        let mut count = 0u32;
        for direct in user_data.direct_referrals.iter() {
            if let Ok(direct_data) = get_user(env, &direct) {
                if direct_data.is_active {
                    count += 1;
                }
            }
        }
        count
    }

    /// Breadth-first sweep of the sponsor graph below a member.
    pub fn all_downline(env: &Env, user: &Address) -> Vec<Address> {
        let mut downline = Vec::new(env);
        let mut visited: Map<Address, bool> = Map::new(env);
        visited.set(user.clone(), true);

        let mut queue = Vec::new(env);
        queue.push_back(user.clone());
        while let Some(current) = queue.pop_front() {
            let current_data = match get_user(env, &current) {
                Ok(data) => data,
                Err(_) => continue,
            };
            for direct in current_data.direct_referrals.iter() {
                if visited.contains_key(direct.clone()) {
                    continue;
                }
                visited.set(direct.clone(), true);
                downline.push_back(direct.clone());
                queue.push_back(direct);
            }
        }
        downline
    }

    pub fn get_or_new_node(env: &Env, user: &Address) -> BinaryNode {
        env.storage()
            .persistent()
            .get(&DataKey::BinaryNode(user.clone()))
            .unwrap_or(BinaryNode {
                parent: None,
                position: None,
                left_child: None,
                right_child: None,
                left_volume: 0,
                right_volume: 0,
                personal_volume: 0,
                left_since: 0,
                right_since: 0,
            })
    }

    pub fn save_node(env: &Env, user: &Address, node: &BinaryNode) {
        let is_new = !env
            .storage()
            .persistent()
            .has(&DataKey::BinaryNode(user.clone()));
        env.storage()
            .persistent()
            .set(&DataKey::BinaryNode(user.clone()), node);
        if is_new {
            let mut members = env
                .storage()
                .persistent()
                .get::<_, Vec<Address>>(&DataKey::BinaryMembers)
                .unwrap_or_else(|| Vec::new(env));
            members.push_back(user.clone());
            env.storage()
                .persistent()
                .set(&DataKey::BinaryMembers, &members);
        }
    }

    /// Push purchase volume into the purchaser's node and every placement
    /// ancestor's facing leg.
    pub fn add_binary_volume(env: &Env, purchaser: &Address, amount: i128) {
        let now = env.ledger().timestamp();
        let mut node = Self::get_or_new_node(env, purchaser);
        node.personal_volume += amount;
        Self::save_node(env, purchaser, &node);

        let mut visited: Map<Address, bool> = Map::new(env);
        visited.set(purchaser.clone(), true);
        let mut depth = 0u32;

        while let (Some(parent), Some(position)) = (node.parent.clone(), node.position) {
            if depth >= MAX_TREE_DEPTH || visited.contains_key(parent.clone()) {
                break;
            }
            let mut parent_node = Self::get_or_new_node(env, &parent);
            match position {
                Leg::Left => {
                    if parent_node.left_volume == 0 {
                        parent_node.left_since = now;
                    }
                    parent_node.left_volume += amount;
                }
                Leg::Right => {
                    if parent_node.right_volume == 0 {
                        parent_node.right_since = now;
                    }
                    parent_node.right_volume += amount;
                }
            }
            Self::save_node(env, &parent, &parent_node);
            visited.set(parent.clone(), true);
            node = parent_node;
            depth += 1;
        }
    }
}
