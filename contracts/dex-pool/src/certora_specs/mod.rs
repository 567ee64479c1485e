// ============================================================================
// CERTORA SUNBEAM FORMAL VERIFICATION SPECIFICATIONS
// ============================================================================
//
// Rules for the concentrated liquidity pool, built only with the `certora`
// feature.
//
// STRUCTURE:
//
// - math_specs.rs : tick math, mul-div rounding and liquidity deltas
// - tick_specs.rs : tick ranges, protocol fees and swap step bounds,
//                   checked against the predicates in `crate::invariants`
//
// USAGE:
// - Certora build: cargo build --features certora -p dex-pool
// - Verification: certoraSorobanProver dex_pool.conf
//
// ============================================================================

pub mod math_specs;
pub mod tick_specs;
