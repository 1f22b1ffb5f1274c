use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(CrawlJobs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CrawlJobs::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(CrawlJobs::Url).string_len(2048).not_null())
                    .col(
                        ColumnDef::new(CrawlJobs::Status)
                            .string_len(16)
                            .not_null()
                            .default("queued"),
                    )
                    .col(ColumnDef::new(CrawlJobs::Title).text())
                    .col(ColumnDef::new(CrawlJobs::HtmlVersion).string())
                    .col(ColumnDef::new(CrawlJobs::H1).integer().not_null().default(0))
                    .col(ColumnDef::new(CrawlJobs::H2).integer().not_null().default(0))
                    .col(ColumnDef::new(CrawlJobs::H3).integer().not_null().default(0))
                    .col(ColumnDef::new(CrawlJobs::H4).integer().not_null().default(0))
                    .col(ColumnDef::new(CrawlJobs::H5).integer().not_null().default(0))
                    .col(ColumnDef::new(CrawlJobs::H6).integer().not_null().default(0))
                    .col(
                        ColumnDef::new(CrawlJobs::InternalLinks)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(CrawlJobs::ExternalLinks)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(CrawlJobs::InaccessibleLinks)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(CrawlJobs::HasLoginForm)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(CrawlJobs::ScreenshotPath).string())
                    .col(ColumnDef::new(CrawlJobs::ErrorMessage).text())
                    .col(
                        ColumnDef::new(CrawlJobs::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(CrawlJobs::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(CrawlJobs::DeletedAt).timestamp_with_time_zone())
                    .to_owned(),
            )
            .await?;

        // Claim query: WHERE status = 'queued' ORDER BY created_at
        manager
            .create_index(
                Index::create()
                    .name("idx_crawl_jobs_status_created_at")
                    .table(CrawlJobs::Table)
                    .col(CrawlJobs::Status)
                    .col(CrawlJobs::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_crawl_jobs_deleted_at")
                    .table(CrawlJobs::Table)
                    .col(CrawlJobs::DeletedAt)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CrawlJobs::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum CrawlJobs {
    Table,
    Id,
    Url,
    Status,
    Title,
    HtmlVersion,
    H1,
    H2,
    H3,
    H4,
    H5,
    H6,
    InternalLinks,
    ExternalLinks,
    InaccessibleLinks,
    HasLoginForm,
    ScreenshotPath,
    ErrorMessage,
    CreatedAt,
    UpdatedAt,
    DeletedAt,
}
