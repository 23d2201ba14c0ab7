//! # Entity 模块
//!
//! 包含所有 Sea-ORM 实体定义

pub mod admission_applications;
pub mod content_types;
pub mod group_permissions;
pub mod groups;
pub mod notices;
pub mod permissions;
pub mod user_groups;
pub mod user_sessions;
pub mod users;

pub use admission_applications::Entity as AdmissionApplications;
pub use content_types::Entity as ContentTypes;
pub use group_permissions::Entity as GroupPermissions;
pub use groups::Entity as Groups;
pub use notices::Entity as Notices;
pub use permissions::Entity as Permissions;
pub use user_groups::Entity as UserGroups;
pub use user_sessions::Entity as UserSessions;
pub use users::Entity as Users;
