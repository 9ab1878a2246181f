//! Chromium glue: launching, the live list surface and the profile frame

pub mod frame;
pub mod js_scripts;
pub mod launch;
pub mod surface;
pub mod wrapper;

pub use frame::ChromiumProfileFrame;
pub use launch::{connect_browser, download_managed_browser, find_browser_executable, launch_browser, open_browser};
pub use surface::ChromiumListSurface;
pub use wrapper::{BrowserWrapper, page_url_with_fallback};
