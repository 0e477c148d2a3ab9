use std::sync::Arc;

use clap::Args;
use spareline::identity::Role;
use spareline_app::{
    database::{self, Db},
    domain::identity::{
        IdentityService, PgIdentityService, otp::LogOtpDelivery, records::IdentitySettings,
    },
};

#[derive(Debug, Args)]
pub(crate) struct RoleArgs {
    /// Phone number of an existing user
    #[arg(long)]
    phone: String,

    /// New role: customer, manager or admin
    #[arg(long)]
    role: String,

    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    database_url: String,
}

pub(crate) async fn run(args: RoleArgs) -> Result<(), String> {
    let role: Role = args.role.parse::<Role>().map_err(|error| error.to_string())?;

    let pool = database::connect(&args.database_url)
        .await
        .map_err(|error| format!("failed to connect to database: {error}"))?;

    let service = PgIdentityService::new(
        Db::new(pool),
        IdentitySettings::default(),
        Arc::new(LogOtpDelivery),
    );

    let user = service
        .set_role(args.phone, role)
        .await
        .map_err(|error| format!("failed to change role: {error}"))?;

    println!("user_uuid: {}", user.uuid);
    println!("phone: {}", user.phone);
    println!("role: {}", user.role.as_str());

    Ok(())
}
