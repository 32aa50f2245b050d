use clap::Args;

use strata_daemon::state::AppState;

use crate::cli::op::CliError;

#[derive(Args, Debug, Clone)]
pub struct Health;

#[async_trait::async_trait]
impl crate::cli::op::Op for Health {
    type Error = CliError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let mut lines = Vec::new();

        // 1. Check config directory
        lines.push("Config:".to_string());
        match AppState::load(ctx.config_path.clone()) {
            Ok(state) => {
                lines.push(format!("  directory:    {}", state.strata_dir.display()));
                lines.push("  config.toml:  OK".to_string());
                match state.load_key() {
                    Ok(key) => lines.push(format!("  key.pem:      OK ({})", key.public())),
                    Err(e) => lines.push(format!("  key.pem:      {}", e)),
                }
                lines.push("  repo/:        OK".to_string());
                lines.push("  blobs/:       OK".to_string());
                lines.push(format!("  peername:     {}", state.config.profile.peername));
                lines.push(format!("  api_port:     {}", state.config.api_port));
                lines.push(format!("  online:       {}", state.config.online));
            }
            Err(e) => {
                lines.push(format!("  error: {}", e));
            }
        }

        // 2. Check daemon liveness
        let base = ctx.client.base_url();
        let client = ctx.client.http_client();
        let base = base.as_str().trim_end_matches('/').to_string();

        lines.push(String::new());
        lines.push(format!("Daemon ({}):", base));

        for check in ["livez", "readyz"] {
            let url = format!("{}/_status/{}", base, check);
            let line = match client.get(&url).send().await {
                Ok(resp) if resp.status().is_success() => format!("  {}: OK", check),
                Ok(resp) => format!("  {}: UNHEALTHY ({})", check, resp.status()),
                Err(_) => format!("  {}: NOT REACHABLE", check),
            };
            lines.push(line);
        }

        // 3. Who the daemon is running as
        let identity_url = format!("{}/_status/identity", base);
        if let Ok(resp) = client.get(&identity_url).send().await {
            if let Ok(identity) = resp.json::<serde_json::Value>().await {
                lines.push(format!(
                    "  node:   {} {} ({})",
                    identity["peername"].as_str().unwrap_or_default(),
                    identity["id"].as_str().unwrap_or_default(),
                    if identity["online"].as_bool().unwrap_or(false) {
                        "online"
                    } else {
                        "offline"
                    }
                ));
            }
        }

        Ok(lines.join("\n"))
    }
}
