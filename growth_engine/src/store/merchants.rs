use diesel::prelude::*;

use crate::{
    error::{EngineError, EngineResult},
    models::merchant::{MerchantRow, MetricsUpdate, NewMerchant},
    schema::merchants,
    store::{MerchantStore, SqliteStore},
};

impl MerchantStore for SqliteStore {
    fn insert_merchant(
        &self,
        conn: &mut SqliteConnection,
        row: &NewMerchant<'_>,
    ) -> EngineResult<MerchantRow> {
        use merchants::dsl as m;

        let inserted = diesel::insert_into(m::merchants)
            .values(row)
            .returning(MerchantRow::as_returning())
            .get_result(conn)?;
        Ok(inserted)
    }

    fn merchant_by_code(
        &self,
        conn: &mut SqliteConnection,
        code: &str,
    ) -> EngineResult<MerchantRow> {
        use merchants::dsl as m;

        m::merchants
            .filter(m::merchant_code.eq(code))
            .select(MerchantRow::as_select())
            .first(conn)
            .optional()?
            .ok_or_else(|| EngineError::NotFound {
                entity: "merchant",
                id: code.to_string(),
            })
    }

    fn merchant_by_id(&self, conn: &mut SqliteConnection, id: i32) -> EngineResult<MerchantRow> {
        use merchants::dsl as m;

        m::merchants
            .find(id)
            .select(MerchantRow::as_select())
            .first(conn)
            .optional()?
            .ok_or_else(|| EngineError::NotFound {
                entity: "merchant",
                id: id.to_string(),
            })
    }

    fn update_metrics(
        &self,
        conn: &mut SqliteConnection,
        code: &str,
        update: &MetricsUpdate<'_>,
    ) -> EngineResult<MerchantRow> {
        use merchants::dsl as m;

        diesel::update(m::merchants.filter(m::merchant_code.eq(code)))
            .set(update)
            .returning(MerchantRow::as_returning())
            .get_result(conn)
            .optional()?
            .ok_or_else(|| EngineError::NotFound {
                entity: "merchant",
                id: code.to_string(),
            })
    }

    fn set_dispatch_api_key(
        &self,
        conn: &mut SqliteConnection,
        code: &str,
        api_key: Option<&str>,
    ) -> EngineResult<()> {
        use merchants::dsl as m;

        let updated = diesel::update(m::merchants.filter(m::merchant_code.eq(code)))
            .set(m::dispatch_api_key.eq(api_key))
            .execute(conn)?;
        if updated == 0 {
            return Err(EngineError::NotFound {
                entity: "merchant",
                id: code.to_string(),
            });
        }
        Ok(())
    }
}
