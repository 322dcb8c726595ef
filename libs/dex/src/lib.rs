//! Uniswap V2 contract surface shared by the SwapDesk client
//!
//! # Architecture
//!
//! ```text
//! libs/dex/
//! ├── abi/
//! │   ├── bindings.rs    # abigen! contract bindings (ERC-20, WETH, MockDAI, V2 router/factory/pair)
//! │   ├── events.rs      # Swap log decoding with semantic validation
//! │   ├── tokens.rs      # ERC-20 and WETH event ABIs
//! │   └── uniswap_v2.rs  # V2 pair event ABIs
//! └── event_signatures.rs
//! ```
//!
//! The contracts themselves are the stock Uniswap V2 deployment; nothing here
//! reimplements on-chain logic.

pub mod abi;
pub mod event_signatures;

pub use abi::bindings::{
    IMockDAI, IUniswapV2Factory, IUniswapV2Pair, IUniswapV2Router02, IERC20, IWETH,
};
pub use abi::events::{DecodingError, SwapEventDecoder, ValidatedSwap};

pub use event_signatures::{
    to_hex_string, ERC20_APPROVAL, ERC20_TRANSFER, UNISWAP_V2_BURN, UNISWAP_V2_MINT,
    UNISWAP_V2_SWAP, UNISWAP_V2_SYNC, WETH_DEPOSIT, WETH_WITHDRAWAL,
};
