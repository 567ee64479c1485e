use soroban_sdk::contracterror;

/// Errors surfaced by the math libraries and the pool contract
#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum Error {
    // === Pool lifecycle ===
    NotInitialized = 1,
    AlreadyInitialized = 2,
    LockedReentrant = 3,
    InvalidConfig = 4,

    // === Validation ===
    TickOutOfRange = 10,
    SqrtPriceOutOfRange = 11,
    InvalidTickRange = 12,
    TickNotSpaced = 13,
    InvalidPriceLimit = 14,
    ZeroAmount = 15,
    InvalidFeeProtocol = 16,

    // === Capacity ===
    LiquidityOverflow = 20,
    LiquidityUnderflow = 21,
    NoLiquidityToUpdate = 22,
    NoLiquidity = 23,

    // === Settlement ===
    InsufficientInputAmount = 30,
    FlashNotRepaid = 31,

    // === Arithmetic ===
    MathOverflow = 40,
    DivisionByZero = 41,

    // === Oracle ===
    ObservationTooOld = 50,
    ObservationCardinalityZero = 51,
    TickNotInitialized = 52,
}
