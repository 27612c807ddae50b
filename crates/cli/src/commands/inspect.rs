use comfy_table::presets::UTF8_FULL;
use comfy_table::{ContentArrangement, Table};

use rescue_core::config::RecoveryConfig;
use rescue_core::control_block::{Field, FieldState};
use rescue_persistence::misc::{checksum, MiscStore};

pub fn run(config: &RecoveryConfig) -> anyhow::Result<()> {
    let store = MiscStore::from_config(config);

    println!("\nControl Block Report");
    println!("--------------------");

    let block = match store.read() {
        Ok(block) => block,
        Err(e) => {
            println!("{}: UNREADABLE ({})\n", store.path().display(), e);
            return Ok(());
        }
    };

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Field", "Capacity", "State", "Value"]);

    for field in Field::ALL {
        let (state, value) = match block.field(field) {
            FieldState::Unset => ("UNSET", String::new()),
            // Line breaks shown escaped so each argument stays visible.
            FieldState::Text(text) => ("SET", text.escape_debug().to_string()),
        };
        table.add_row(vec![
            field.name().to_string(),
            field.capacity().to_string(),
            state.to_string(),
            value,
        ]);
    }

    println!("{table}");
    println!("Record CRC64: {:016x}\n", checksum(&block.to_bytes()));

    Ok(())
}
