use core::fmt;

use alloy_primitives::{FixedBytes, Selector};

/// `approve(address,uint256)` (ERC-20).
pub const APPROVE_SELECTOR: Selector = FixedBytes([0x09, 0x5e, 0xa7, 0xb3]);

/// `supply(address,uint256,address,uint16)` (Aave v3 pool).
pub const SUPPLY_SELECTOR: Selector = FixedBytes([0x61, 0x7b, 0xa0, 0x37]);

/// `exactInputSingle((address,address,uint24,address,uint256,uint256,uint256,uint160))`
/// (Uniswap v3 router).
pub const EXACT_INPUT_SINGLE_SELECTOR: Selector = FixedBytes([0x41, 0x4b, 0xf3, 0x89]);

/// Action kinds governed by a policy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
#[repr(u8)]
pub enum ActionKind {
    Approval = 0x01,
    Supply = 0x02,
    Swap = 0x03,
}

impl ActionKind {
    /// The one selector a policy of this kind recognises.
    pub const fn selector(self) -> Selector {
        match self {
            ActionKind::Approval => APPROVE_SELECTOR,
            ActionKind::Supply => SUPPLY_SELECTOR,
            ActionKind::Swap => EXACT_INPUT_SINGLE_SELECTOR,
        }
    }

    /// Canonical Solidity signature the selector is derived from.
    pub const fn signature(self) -> &'static str {
        match self {
            ActionKind::Approval => "approve(address,uint256)",
            ActionKind::Supply => "supply(address,uint256,address,uint16)",
            ActionKind::Swap => {
                "exactInputSingle((address,address,uint24,address,uint256,uint256,uint256,uint160))"
            }
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ActionKind::Approval => "approval",
            ActionKind::Supply => "supply",
            ActionKind::Swap => "swap",
        };
        f.write_str(name)
    }
}

impl TryFrom<u8> for ActionKind {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        let kind = match value {
            0x01 => ActionKind::Approval,
            0x02 => ActionKind::Supply,
            0x03 => ActionKind::Swap,
            _ => return Err(()),
        };
        Ok(kind)
    }
}
