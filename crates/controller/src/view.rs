//! Live preview surface
//!
//! The generated artifact renders inside the project's web app. This module
//! drives that page through generated Playwright scripts run with `node`:
//! each operation navigates fresh (which forces the page to re-import the
//! artifact), re-applies the current view mode, and either waits for the
//! mount selector or screenshots the visible container element.
//!
//! Waiting on the mount selector is the primary mount signal; the fixed
//! settle delay is only the fallback upper bound when no signal arrives.

use livecoder_common::{Error, MountOutcome, Result, ViewMode};
use parking_lot::Mutex;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::PreviewConfig;

/// The view the pipeline remounts and captures
#[async_trait::async_trait]
pub trait PreviewSurface: Send + Sync {
    /// Currently displayed view root
    fn mode(&self) -> ViewMode;

    /// Switch between the rendered artifact and the code view
    async fn set_mode(&self, mode: ViewMode) -> Result<()>;

    /// Wait until the surface reports the new artifact mounted, or until
    /// the fallback delay elapses
    async fn wait_mounted(&self, fallback: Duration) -> MountOutcome;

    /// Screenshot the current view root as a base64 PNG data URL
    async fn capture(&self) -> Result<String>;
}

/// Playwright-backed surface driving the live web app headlessly
pub struct BrowserSurface {
    base_url: String,
    toggle_selector: String,
    preview_selector: String,
    code_selector: String,
    screenshot_dir: PathBuf,
    mode: Mutex<ViewMode>,
}

impl BrowserSurface {
    pub fn new(config: &PreviewConfig) -> Result<Self> {
        check_playwright_installed()?;
        std::fs::create_dir_all(&config.screenshot_dir)?;

        Ok(Self {
            base_url: config.base_url.clone(),
            toggle_selector: config.toggle_selector.clone(),
            preview_selector: config.preview_selector.clone(),
            code_selector: config.code_selector.clone(),
            screenshot_dir: config.screenshot_dir.clone(),
            mode: Mutex::new(ViewMode::Preview),
        })
    }

    /// Selector of the element captured in the current mode
    fn capture_selector(&self, mode: ViewMode) -> &str {
        match mode {
            ViewMode::Preview => &self.preview_selector,
            ViewMode::Code => &self.code_selector,
        }
    }

    /// Script prologue: launch, navigate, re-apply the view mode
    fn script_header(&self, mode: ViewMode) -> String {
        let mut script = format!(
            r#"const {{ chromium }} = require('playwright');

(async () => {{
  const browser = await chromium.launch({{ headless: true }});
  const page = await browser.newPage();
  try {{
    await page.goto('{base}');
"#,
            base = js_escape(&self.base_url),
        );

        if mode == ViewMode::Code {
            script.push_str(&format!(
                "    await page.click('{}');\n",
                js_escape(&self.toggle_selector)
            ));
        }

        script
    }

    fn script_footer() -> &'static str {
        r#"  } catch (error) {
    console.error(JSON.stringify({ error: error.message }));
    process.exit(1);
  } finally {
    await browser.close();
  }
})();
"#
    }

    fn mount_script(&self, mode: ViewMode, timeout: Duration) -> String {
        let mut script = self.script_header(mode);
        script.push_str(&format!(
            r#"    const mounted = await page
      .waitForSelector('{selector}', {{ timeout: {timeout} }})
      .then(() => true)
      .catch(() => false);
    console.log(JSON.stringify({{ mounted }}));
"#,
            selector = js_escape(self.capture_selector(mode)),
            timeout = timeout.as_millis(),
        ));
        script.push_str(Self::script_footer());
        script
    }

    fn capture_script(&self, mode: ViewMode, out_path: &str) -> String {
        let selector = js_escape(self.capture_selector(mode));
        let mut script = self.script_header(mode);
        script.push_str(&format!(
            r#"    await page.waitForSelector('{selector}');
    await page.locator('{selector}').screenshot({{ path: '{out}' }});
    console.log(JSON.stringify({{ success: true }}));
"#,
            selector = selector,
            out = js_escape(out_path),
        ));
        script.push_str(Self::script_footer());
        script
    }
}

#[async_trait::async_trait]
impl PreviewSurface for BrowserSurface {
    fn mode(&self) -> ViewMode {
        *self.mode.lock()
    }

    async fn set_mode(&self, mode: ViewMode) -> Result<()> {
        // Scripts are stateless: every operation navigates fresh and
        // re-applies the mode, so this only records the desired one.
        *self.mode.lock() = mode;
        Ok(())
    }

    async fn wait_mounted(&self, fallback: Duration) -> MountOutcome {
        let script = self.mount_script(self.mode(), fallback);

        match run_node_script(&script).await {
            Ok(stdout) => {
                let mounted = stdout
                    .lines()
                    .rev()
                    .find_map(|line| serde_json::from_str::<serde_json::Value>(line).ok())
                    .and_then(|v| v.get("mounted").and_then(|m| m.as_bool()))
                    .unwrap_or(false);

                if mounted {
                    debug!("preview reported artifact mounted");
                    MountOutcome::Mounted
                } else {
                    MountOutcome::FallbackElapsed
                }
            }
            Err(e) => {
                warn!(error = %e, "mount check script failed; falling back to settle delay");
                tokio::time::sleep(fallback).await;
                MountOutcome::FallbackElapsed
            }
        }
    }

    async fn capture(&self) -> Result<String> {
        let out_path = self
            .screenshot_dir
            .join(format!("capture-{}.png", Uuid::new_v4()));
        let out = out_path.to_string_lossy().to_string();

        let script = self.capture_script(self.mode(), &out);
        run_node_script(&script).await?;

        let bytes = std::fs::read(&out_path)?;
        use base64::Engine as _;
        let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
        Ok(format!("data:image/png;base64,{}", encoded))
    }
}

/// Write the script to a temp dir and execute it with node
async fn run_node_script(script: &str) -> Result<String> {
    let temp_dir = tempfile::tempdir()?;
    let script_path = temp_dir.path().join("surface.js");
    std::fs::write(&script_path, script)?;

    debug!("running preview script: {}", script_path.display());

    let output = Command::new("node")
        .arg(&script_path)
        .current_dir(temp_dir.path())
        .output()
        .await
        .map_err(|e| Error::Capture(format!("failed to run node: {}", e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let stdout = String::from_utf8_lossy(&output.stdout);
        return Err(Error::Capture(format!(
            "preview script failed:\nstdout: {}\nstderr: {}",
            stdout, stderr
        )));
    }

    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}

fn check_playwright_installed() -> Result<()> {
    let status = std::process::Command::new("npx")
        .args(["playwright", "--version"])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();

    match status {
        Ok(status) if status.success() => Ok(()),
        _ => Err(Error::Capture(
            "Playwright not found. Install with: npx playwright install".to_string(),
        )),
    }
}

fn js_escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('\'', "\\'")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn surface() -> BrowserSurface {
        let config = PreviewConfig::default();
        BrowserSurface {
            base_url: config.base_url,
            toggle_selector: config.toggle_selector,
            preview_selector: config.preview_selector,
            code_selector: config.code_selector,
            screenshot_dir: config.screenshot_dir,
            mode: Mutex::new(ViewMode::Preview),
        }
    }

    #[test]
    fn preview_mode_script_skips_the_toggle() {
        let script = surface().mount_script(ViewMode::Preview, Duration::from_secs(2));
        assert!(script.contains("waitForSelector('[data-preview-root]'"));
        assert!(!script.contains("page.click"));
    }

    #[test]
    fn code_mode_script_clicks_the_toggle_and_targets_the_code_container() {
        let script = surface().capture_script(ViewMode::Code, "/tmp/out.png");
        assert!(script.contains("page.click('[data-code-toggle]')"));
        assert!(script.contains(".react-code-blocks-container"));
    }

    #[test]
    fn js_escape_handles_quotes() {
        assert_eq!(js_escape("it's"), "it\\'s");
        assert_eq!(js_escape(r"a\b"), r"a\\b");
    }
}
