// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 P2E Inferno

//! DG token vendor events used by the buy/sell quest tasks.

use alloy::sol;

sol! {
    #[derive(Debug)]
    interface IDGTokenVendor {
        event TokensPurchased(address indexed buyer, uint256 baseTokenAmount, uint256 swapTokenAmount, uint256 fee);
        event TokensSold(address indexed seller, uint256 swapTokenAmount, uint256 baseTokenAmount, uint256 fee);
    }
}
