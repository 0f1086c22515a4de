//! Solidity ABI surface of the ERC-7579 account the guard inspects.

use alloy_sol_types::sol;

sol! {
    interface IERC7579Execution {
        function execute(bytes32 mode, bytes executionCalldata) external payable;
    }
}
