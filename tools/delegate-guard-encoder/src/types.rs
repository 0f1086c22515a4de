use alloy_primitives::{Address, U256};

/// Uniswap v3 `ExactInputSingleParams`.
#[derive(Clone, Debug)]
pub struct SwapParams {
    pub token_in: Address,
    pub token_out: Address,
    /// Fee tier, `uint24` on the wire.
    pub fee: u32,
    /// Must be the swapping account for a policy to accept it.
    pub recipient: Address,
    pub deadline: U256,
    pub amount_in: U256,
    pub amount_out_minimum: U256,
    pub sqrt_price_limit_x96: U256,
}
