//! Config template command.

use anyhow::Result;

pub fn execute() -> Result<()> {
    print!("{}", crate::config::TEMPLATE);
    Ok(())
}
