//! Create essay table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Essay::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Essay::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Essay::AuthorId).string_len(32).not_null())
                    .col(ColumnDef::new(Essay::Title).string_len(300).not_null())
                    .col(ColumnDef::new(Essay::Body).text().not_null())
                    .col(ColumnDef::new(Essay::Kind).string_len(16).not_null())
                    .col(ColumnDef::new(Essay::Category).string_len(32).not_null())
                    .col(
                        ColumnDef::new(Essay::Published)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Essay::Insightful)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Essay::NotHelpful)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Essay::Views).integer().not_null().default(0))
                    .col(
                        ColumnDef::new(Essay::CommentCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Essay::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_essay_author")
                            .from(Essay::Table, Essay::AuthorId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: author_id (profile listings)
        manager
            .create_index(
                Index::create()
                    .name("idx_essay_author_id")
                    .table(Essay::Table)
                    .col(Essay::AuthorId)
                    .to_owned(),
            )
            .await?;

        // Index: published + created_at (public listings)
        manager
            .create_index(
                Index::create()
                    .name("idx_essay_published_created_at")
                    .table(Essay::Table)
                    .col(Essay::Published)
                    .col(Essay::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Essay::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Essay {
    Table,
    Id,
    AuthorId,
    Title,
    Body,
    Kind,
    Category,
    Published,
    Insightful,
    NotHelpful,
    Views,
    CommentCount,
    CreatedAt,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}
