use super::STARTING_BALANCE;
use crate::blockchain::Block;

/// Balance of `address` according to `chain`.
///
/// Walks from the tip back towards genesis, summing every output credited
/// to the address. The walk stops after the most recent block in which the
/// address spent: that spend's change output already carries the whole
/// balance at that point, so nothing older may be added on top of it.
pub fn calculate_balance(chain: &[Block], address: &str) -> u64 {
    let mut has_conducted_transaction = false;
    let mut outputs_total: u64 = 0;

    for block in chain.iter().skip(1).rev() {
        for tx in &block.data {
            if tx.input.address == address {
                has_conducted_transaction = true;
            }
            if let Some(amount) = tx.output_map.get(address) {
                outputs_total = outputs_total.saturating_add(*amount);
            }
        }
        if has_conducted_transaction {
            break;
        }
    }

    if has_conducted_transaction {
        outputs_total
    } else {
        STARTING_BALANCE.saturating_add(outputs_total)
    }
}
