//! # appig
//!
//! Rule-driven generator for fixed-size image variants. A single configuration
//! document describes which source images turn into which output files, at
//! which sizes, with which recoloring and overlays. One run turns that document
//! into files on disk, plus an optional asset-catalog `Contents.json` for every
//! output directory that asks for one.
//!
//! # Pipeline
//!
//! ```text
//! appig.json ──► Configuration ──► Generator::new   (selector → valid rules)
//!                                      │
//!                                      ▼
//!                                Generator::plan    (rules × sources × images → tasks)
//!                                      │
//!                                      ▼
//!                          imaging::generate_image  (crop → resize → write → retouch)
//!                                      │
//!                                      ▼
//!                         ContentsUpdater::run      (Contents.json per directory)
//! ```
//!
//! Every stage runs sequentially. A task either succeeds or stops the run;
//! outputs already written stay where they are.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`config`] | Configuration document discovery and loading (JSON or TOML) |
//! | [`validation`] | Schema checks for rules and image specs |
//! | [`generate`] | Selector resolution, task expansion, sequential run |
//! | [`imaging`] | Crop geometry, staged transforms, `image`-crate backend |
//! | [`contents`] | `Contents.json` synchronization |
//! | [`output`] | CLI output formatting for progress events |
//!
//! # Configuration Document
//!
//! ```json
//! {
//!   "options": { "rootPath": "build", "createContentsJson": false },
//!   "rules": {
//!     "ios:icon": {
//!       "sourceFile": "assets/icon.png",
//!       "createContentsJson": { "idiom": "iphone", "scale": "2x" },
//!       "images": [
//!         { "fileName": "icon-60@2x.png", "targetPath": "Assets.xcassets/AppIcon.appiconset", "size": "120x120" },
//!         { "fileName": "icon-60@3x.png", "targetPath": "Assets.xcassets/AppIcon.appiconset", "size": "180x180",
//!           "createContentsJson": { "idiom": "iphone", "scale": "3x" } }
//!       ]
//!     }
//!   }
//! }
//! ```

pub mod config;
pub mod contents;
pub mod generate;
pub mod imaging;
pub mod output;
pub mod validation;

#[cfg(test)]
pub(crate) mod test_helpers;
