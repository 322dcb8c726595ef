//! Contract bindings for the deployed Uniswap V2 fork
//!
//! Only the functions the client calls are listed. Each binding lives in its
//! own module so the generated call/return types do not collide.

pub mod erc20 {
    use ethers::prelude::abigen;

    abigen!(
        IERC20,
        r#"[
            function balanceOf(address account) external view returns (uint256)
            function allowance(address owner, address spender) external view returns (uint256)
            function approve(address spender, uint256 amount) external returns (bool)
            function transfer(address to, uint256 amount) external returns (bool)
            function decimals() external view returns (uint8)
        ]"#,
    );
}

pub mod weth {
    use ethers::prelude::abigen;

    abigen!(
        IWETH,
        r#"[
            function deposit() external payable
            function withdraw(uint256 wad) external
        ]"#,
    );
}

pub mod mock_dai {
    use ethers::prelude::abigen;

    abigen!(
        IMockDAI,
        r#"[
            function mint(address to, uint256 amount) external
        ]"#,
    );
}

pub mod router {
    use ethers::prelude::abigen;

    abigen!(
        IUniswapV2Router02,
        r#"[
            function factory() external pure returns (address)
            function WETH() external pure returns (address)
            function addLiquidity(address tokenA, address tokenB, uint amountADesired, uint amountBDesired, uint amountAMin, uint amountBMin, address to, uint deadline) external returns (uint amountA, uint amountB, uint liquidity)
            function swapExactTokensForTokens(uint amountIn, uint amountOutMin, address[] calldata path, address to, uint deadline) external returns (uint[] memory amounts)
            function getAmountsOut(uint amountIn, address[] calldata path) external view returns (uint[] memory amounts)
        ]"#,
    );
}

pub mod factory {
    use ethers::prelude::abigen;

    abigen!(
        IUniswapV2Factory,
        r#"[
            function getPair(address tokenA, address tokenB) external view returns (address pair)
        ]"#,
    );
}

pub mod pair {
    use ethers::prelude::abigen;

    abigen!(
        IUniswapV2Pair,
        r#"[
            function getReserves() external view returns (uint112 reserve0, uint112 reserve1, uint32 blockTimestampLast)
            function token0() external view returns (address)
            function token1() external view returns (address)
        ]"#,
    );
}

pub use erc20::IERC20;
pub use factory::IUniswapV2Factory;
pub use mock_dai::IMockDAI;
pub use pair::IUniswapV2Pair;
pub use router::IUniswapV2Router02;
pub use weth::IWETH;
