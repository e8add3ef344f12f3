//! Panel operations of the [`Dashboard`](crate::dashboard::Dashboard).
//!
//! Each submodule adds an `impl Dashboard` block for one panel:
//!
//! | Panel | Module | Backend surface |
//! |-------|--------|-----------------|
//! | News | [`news`] | `/api/news/*` |
//! | Articles | [`articles`] | `/api/articles/*`, draft push |
//! | Drafts | [`drafts`] | `/api/wechat/draft/*` |
//! | Config | [`config`] | `/api/config*`, `/api/wechat/bind`, `/api/wechat/status` |

pub mod articles;
pub mod config;
pub mod drafts;
pub mod news;
