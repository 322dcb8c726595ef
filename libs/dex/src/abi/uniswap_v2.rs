//! Uniswap V2 pair event ABIs

use ethabi::{Event, EventParam, ParamType};

fn param(name: &str, kind: ParamType, indexed: bool) -> EventParam {
    EventParam {
        name: name.to_string(),
        kind,
        indexed,
    }
}

/// event Swap(address indexed sender, uint256 amount0In, uint256 amount1In, uint256 amount0Out, uint256 amount1Out, address indexed to)
pub fn swap_event() -> Event {
    Event {
        name: "Swap".to_string(),
        inputs: vec![
            param("sender", ParamType::Address, true),
            param("amount0In", ParamType::Uint(256), false),
            param("amount1In", ParamType::Uint(256), false),
            param("amount0Out", ParamType::Uint(256), false),
            param("amount1Out", ParamType::Uint(256), false),
            param("to", ParamType::Address, true),
        ],
        anonymous: false,
    }
}

/// event Mint(address indexed sender, uint256 amount0, uint256 amount1)
pub fn mint_event() -> Event {
    Event {
        name: "Mint".to_string(),
        inputs: vec![
            param("sender", ParamType::Address, true),
            param("amount0", ParamType::Uint(256), false),
            param("amount1", ParamType::Uint(256), false),
        ],
        anonymous: false,
    }
}

/// event Burn(address indexed sender, uint256 amount0, uint256 amount1, address indexed to)
pub fn burn_event() -> Event {
    Event {
        name: "Burn".to_string(),
        inputs: vec![
            param("sender", ParamType::Address, true),
            param("amount0", ParamType::Uint(256), false),
            param("amount1", ParamType::Uint(256), false),
            param("to", ParamType::Address, true),
        ],
        anonymous: false,
    }
}

/// event Sync(uint112 reserve0, uint112 reserve1)
pub fn sync_event() -> Event {
    Event {
        name: "Sync".to_string(),
        inputs: vec![
            param("reserve0", ParamType::Uint(112), false),
            param("reserve1", ParamType::Uint(112), false),
        ],
        anonymous: false,
    }
}
