pub const SYSTEM_PROGRAM_ID: &str = "11111111111111111111111111111111";
pub const WRAPPED_SOL_MINT: &str = "So11111111111111111111111111111111111111112";
pub const WRAPPED_SOL_DECIMALS: u8 = 9;

#[derive(Debug, Clone, Copy)]
pub struct SwapProgram {
    pub id: &'static str,
    pub name: &'static str,
}

pub const SWAP_PROGRAMS: [SwapProgram; 10] = [
    SwapProgram {
        id: "JUP6LkbZbjS1jKKwapdHNy74zcZ3tLUZoi5QNyVTaV4",
        name: "jupiter",
    },
    SwapProgram {
        id: "675kPX9MHTjS2zt1qfr1NYHuzeLXfQM9H24wFSUt1Mp8",
        name: "raydium_amm",
    },
    SwapProgram {
        id: "CPMMoo8L3F4NbTegBCKVNunggL7H1ZpdTHKxQB5qKP1C",
        name: "raydium_cpmm",
    },
    SwapProgram {
        id: "CAMMCzo5YL8w4VFF8KVHrK22GGUsp5VTaW7grrKgrWqK",
        name: "raydium_clmm",
    },
    SwapProgram {
        id: "whirLbMiicVdio4qvUfM5KAg6Ct8VwpYzGff3uctyCc",
        name: "orca_whirlpool",
    },
    SwapProgram {
        id: "9W959DqEETiGZocYWCQPaJ6sBmUzgfxXfqGeTEdp3aQP",
        name: "orca",
    },
    SwapProgram {
        id: "LBUZKhRxPF3XUpBCjp4YzTKgLccjZhTSDM9YuVaPwxo",
        name: "meteora_dlmm",
    },
    SwapProgram {
        id: "Eo7WjKq67rjJQSZxS6z3YkapzY3eMj6Xy8X5EQVn5UaB",
        name: "meteora_pools",
    },
    SwapProgram {
        id: "6EF8rrecthR5Dkzon8Nwu78hRvfCKubJ14M5uBEwF6P",
        name: "pumpfun",
    },
    SwapProgram {
        id: "MoonCVVNZFSYkqNXP6bxHLPL6QQJiMagDL3qcqUQTrG",
        name: "moonshot",
    },
];

pub fn swap_program_name(program_id: &str) -> Option<&'static str> {
    SWAP_PROGRAMS
        .iter()
        .find(|program| program.id == program_id)
        .map(|program| program.name)
}
