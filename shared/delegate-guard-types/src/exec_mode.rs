//! ERC-7579 execution mode word.
//!
//! Layout: `bytes1 callType || bytes1 execType || bytes4 unused || bytes4 modeSelector ||
//! bytes22 modePayload`.

use alloy_primitives::{FixedBytes, Selector};

/// `execute(bytes32,bytes)` on an ERC-7579 account.
pub const EXECUTE_SELECTOR: Selector = FixedBytes([0xe9, 0xae, 0x5c, 0x53]);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum CallType {
    Single = 0x00,
    Batch = 0x01,
    Static = 0xFE,
    Delegate = 0xFF,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum ExecType {
    Default = 0x00,
    Try = 0x01,
}

impl TryFrom<u8> for CallType {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        let call_type = match value {
            0x00 => CallType::Single,
            0x01 => CallType::Batch,
            0xFE => CallType::Static,
            0xFF => CallType::Delegate,
            _ => return Err(()),
        };
        Ok(call_type)
    }
}

/// Raw 32-byte execution mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ExecMode(pub FixedBytes<32>);

impl ExecMode {
    /// Single call, default exec type, no mode selector: the only mode the guard understands.
    pub const SINGLE: ExecMode = ExecMode(FixedBytes::ZERO);

    pub fn new(call_type: CallType, exec_type: ExecType) -> Self {
        let mut word = [0u8; 32];
        word[0] = call_type as u8;
        word[1] = exec_type as u8;
        ExecMode(FixedBytes(word))
    }

    /// Decoded call type, or the raw byte when it is not a known ERC-7579 call type.
    pub fn call_type(&self) -> Result<CallType, u8> {
        CallType::try_from(self.0[0]).map_err(|_| self.0[0])
    }

    pub fn is_single(&self) -> bool {
        *self == Self::SINGLE
    }
}

impl From<FixedBytes<32>> for ExecMode {
    fn from(word: FixedBytes<32>) -> Self {
        ExecMode(word)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn call_type_reads_first_byte() {
        let batch = ExecMode::new(CallType::Batch, ExecType::Try);
        assert_eq!(batch.call_type(), Ok(CallType::Batch));
        assert!(!batch.is_single());
        assert_eq!(ExecMode::SINGLE.call_type(), Ok(CallType::Single));

        let mut word = [0u8; 32];
        word[0] = 0x42;
        let unknown = ExecMode::from(FixedBytes(word));
        assert_eq!(unknown.call_type(), Err(0x42));
    }

    #[test]
    fn zero_word_is_single() {
        assert!(ExecMode::from(FixedBytes::ZERO).is_single());
        let mut word = [0u8; 32];
        word[10] = 1;
        assert!(!ExecMode::from(FixedBytes(word)).is_single());
    }
}
