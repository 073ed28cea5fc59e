// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 P2E Inferno

//! Unlock Protocol interfaces: membership locks and the lock factory.

use alloy::sol;

sol! {
    #[sol(rpc)]
    interface IPublicLock {
        function getHasValidKey(address _user) external view returns (bool);
    }
}

sol! {
    /// Unlock factory; `createLock` / `createUpgradeableLock` emit `NewLock`.
    #[derive(Debug)]
    interface IUnlock {
        event NewLock(address indexed lockOwner, address indexed newLockAddress);
    }
}
