use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum Users {
    Table,
    Id,
    Role,
}

#[derive(Iden)]
enum FinancialAccount {
    Table,
    Id,
    UserId,
    Name,
    Kind,
    InitialBalance,
    Balance,
    Deleted,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Transaction {
    Table,
    Id,
    UserId,
    Kind,
    Amount,
    Description,
    Date,
    FromAccountId,
    ToAccountId,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Category {
    Table,
    Id,
    UserId,
    Name,
    NameNorm,
    Kind,
    Deleted,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum TransactionCategory {
    Table,
    TransactionId,
    CategoryId,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 1. Users
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Users::Id).string().not_null().primary_key())
                    .col(
                        ColumnDef::new(Users::Role)
                            .string()
                            .not_null()
                            .default("user"),
                    )
                    .to_owned(),
            )
            .await?;

        // 2. Financial accounts
        manager
            .create_table(
                Table::create()
                    .table(FinancialAccount::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(FinancialAccount::Id)
                            .blob()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(FinancialAccount::UserId).string().not_null())
                    .col(ColumnDef::new(FinancialAccount::Name).string().not_null())
                    .col(ColumnDef::new(FinancialAccount::Kind).string().not_null())
                    .col(
                        ColumnDef::new(FinancialAccount::InitialBalance)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(FinancialAccount::Balance)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(FinancialAccount::Deleted)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(FinancialAccount::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(FinancialAccount::UpdatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-financial_account-user_id")
                            .from(FinancialAccount::Table, FinancialAccount::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-financial_account-user_id")
                    .table(FinancialAccount::Table)
                    .col(FinancialAccount::UserId)
                    .to_owned(),
            )
            .await?;

        // 3. Transactions
        manager
            .create_table(
                Table::create()
                    .table(Transaction::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Transaction::Id)
                            .blob()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Transaction::UserId).string().not_null())
                    .col(ColumnDef::new(Transaction::Kind).string().not_null())
                    .col(ColumnDef::new(Transaction::Amount).big_integer().not_null())
                    .col(
                        ColumnDef::new(Transaction::Description)
                            .string()
                            .not_null()
                            .default(""),
                    )
                    .col(ColumnDef::new(Transaction::Date).timestamp().not_null())
                    .col(ColumnDef::new(Transaction::FromAccountId).blob())
                    .col(ColumnDef::new(Transaction::ToAccountId).blob())
                    .col(ColumnDef::new(Transaction::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Transaction::UpdatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-transaction-user_id")
                            .from(Transaction::Table, Transaction::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-transaction-from_account_id")
                            .from(Transaction::Table, Transaction::FromAccountId)
                            .to(FinancialAccount::Table, FinancialAccount::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-transaction-to_account_id")
                            .from(Transaction::Table, Transaction::ToAccountId)
                            .to(FinancialAccount::Table, FinancialAccount::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-transaction-user_id-date")
                    .table(Transaction::Table)
                    .col(Transaction::UserId)
                    .col(Transaction::Date)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-transaction-from_account_id")
                    .table(Transaction::Table)
                    .col(Transaction::FromAccountId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-transaction-to_account_id")
                    .table(Transaction::Table)
                    .col(Transaction::ToAccountId)
                    .to_owned(),
            )
            .await?;

        // 4. Categories
        manager
            .create_table(
                Table::create()
                    .table(Category::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Category::Id)
                            .blob()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Category::UserId).string().not_null())
                    .col(ColumnDef::new(Category::Name).string().not_null())
                    .col(ColumnDef::new(Category::NameNorm).string().not_null())
                    .col(ColumnDef::new(Category::Kind).string().not_null())
                    .col(
                        ColumnDef::new(Category::Deleted)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Category::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Category::UpdatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-category-user_id")
                            .from(Category::Table, Category::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Not unique: soft-deleted categories may share a name with an active one.
        manager
            .create_index(
                Index::create()
                    .name("idx-category-user_id-name_norm")
                    .table(Category::Table)
                    .col(Category::UserId)
                    .col(Category::NameNorm)
                    .to_owned(),
            )
            .await?;

        // 5. Transaction ↔ category links
        manager
            .create_table(
                Table::create()
                    .table(TransactionCategory::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TransactionCategory::TransactionId)
                            .blob()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(TransactionCategory::CategoryId)
                            .blob()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-transaction_category-transaction_id")
                            .from(
                                TransactionCategory::Table,
                                TransactionCategory::TransactionId,
                            )
                            .to(Transaction::Table, Transaction::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-transaction_category-category_id")
                            .from(TransactionCategory::Table, TransactionCategory::CategoryId)
                            .to(Category::Table, Category::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-transaction_category-category_id")
                    .table(TransactionCategory::Table)
                    .col(TransactionCategory::CategoryId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(TransactionCategory::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Category::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Transaction::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(FinancialAccount::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;
        Ok(())
    }
}
