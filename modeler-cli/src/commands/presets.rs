//! Presets command - List material presets

use clap::Args;
use modeler_core::materials::material_name;
use modeler_core::Config;

/// Arguments for the presets command
#[derive(Args, Debug)]
pub struct PresetsArgs {
    /// Print presets as JSON
    #[arg(long)]
    pub json: bool,
}

impl PresetsArgs {
    /// Execute the presets command
    pub fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let catalog = config.material_catalog()?;

        if self.json {
            let presets: serde_json::Map<String, serde_json::Value> = catalog
                .iter()
                .map(|(name, preset)| serde_json::to_value(preset).map(|v| (name.to_string(), v)))
                .collect::<serde_json::Result<_>>()?;
            println!("{}", serde_json::to_string_pretty(&presets)?);
            return Ok(());
        }

        println!("Material Presets");
        println!("================");
        println!();
        for (name, preset) in catalog.iter() {
            let [r, g, b, a] = preset.base_color;
            println!(
                "  {:<16} {:<20} color ({:.2}, {:.2}, {:.2}, {:.2})  metallic {:.2}  roughness {:.2}",
                name,
                material_name(name),
                r,
                g,
                b,
                a,
                preset.metallic,
                preset.roughness
            );
        }

        Ok(())
    }
}
