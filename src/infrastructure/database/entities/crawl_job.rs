// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use sea_orm::entity::prelude::*;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "crawl_jobs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub url: String,
    pub status: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub title: Option<String>,
    pub html_version: Option<String>,
    pub h1: i32,
    pub h2: i32,
    pub h3: i32,
    pub h4: i32,
    pub h5: i32,
    pub h6: i32,
    pub internal_links: i32,
    pub external_links: i32,
    pub inaccessible_links: i32,
    pub has_login_form: bool,
    pub screenshot_path: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub error_message: Option<String>,
    pub created_at: ChronoDateTimeWithTimeZone,
    pub updated_at: ChronoDateTimeWithTimeZone,
    pub deleted_at: Option<ChronoDateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
