//! ERC-20 and WETH event ABIs

use ethabi::{Event, EventParam, ParamType};

fn transfer_like(name: &str, from: &str, to: &str) -> Event {
    Event {
        name: name.to_string(),
        inputs: vec![
            EventParam {
                name: from.to_string(),
                kind: ParamType::Address,
                indexed: true,
            },
            EventParam {
                name: to.to_string(),
                kind: ParamType::Address,
                indexed: true,
            },
            EventParam {
                name: "value".to_string(),
                kind: ParamType::Uint(256),
                indexed: false,
            },
        ],
        anonymous: false,
    }
}

fn wad_event(name: &str, holder: &str) -> Event {
    Event {
        name: name.to_string(),
        inputs: vec![
            EventParam {
                name: holder.to_string(),
                kind: ParamType::Address,
                indexed: true,
            },
            EventParam {
                name: "wad".to_string(),
                kind: ParamType::Uint(256),
                indexed: false,
            },
        ],
        anonymous: false,
    }
}

/// event Transfer(address indexed from, address indexed to, uint256 value)
pub fn transfer_event() -> Event {
    transfer_like("Transfer", "from", "to")
}

/// event Approval(address indexed owner, address indexed spender, uint256 value)
pub fn approval_event() -> Event {
    transfer_like("Approval", "owner", "spender")
}

/// event Deposit(address indexed dst, uint256 wad)
pub fn deposit_event() -> Event {
    wad_event("Deposit", "dst")
}

/// event Withdrawal(address indexed src, uint256 wad)
pub fn withdrawal_event() -> Event {
    wad_event("Withdrawal", "src")
}
