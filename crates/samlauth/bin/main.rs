use ambkit_cli::{handler, utils};
use ambkit_config::{AwsProfileConfig, IdpConfig};
use eyre::{Result, WrapErr};
use reqwest::Url;
use samlauth::{
    assertion::{decode_assertion, roles_from_assertion},
    credentials::{write_profile, ProfileValues},
    form::{extract_saml_response, parse_login_form, resolve_submit_url},
    select_role,
    sts::assume_with_saml,
    IdpClient,
};

fn main() -> Result<()> {
    handler::install();
    utils::load_dotenv();
    utils::subscriber();
    run()
}

#[tokio::main]
async fn run() -> Result<()> {
    let aws = AwsProfileConfig::from_env()?;
    let idp = IdpConfig::from_env();

    let user = match idp.user.clone() {
        Some(user) => user,
        None => utils::prompt_line("Username: ")?,
    };
    let username = format!("{}\\{}", idp.realm, user);
    let password = utils::read_secret("Password: ", idp.pass.clone())?;

    let client = IdpClient::new(idp.verify_tls)?;
    let (landing_url, login_html) = client.fetch_login_form(&idp.entry_url).await?;

    let form = parse_login_form(&login_html, &username, &password)?;
    // The plaintext credentials live in the payload; keep them no
    // longer than the submission needs them.
    drop((user, username, password));

    let entry_url = Url::parse(&idp.entry_url).wrap_err("invalid IDP_ENTRY_URL")?;
    let submit_url = resolve_submit_url(&entry_url, landing_url, form.action.as_deref())?;
    let response_html = client.submit_form(submit_url, &form.payload).await?;
    drop(form);

    let Some(assertion_b64) = extract_saml_response(&response_html)? else {
        eyre::bail!("the response did not contain a valid SAML assertion");
    };
    let assertion_xml = decode_assertion(&assertion_b64)?;
    let roles = roles_from_assertion(&assertion_xml)?;
    if roles.is_empty() {
        eyre::bail!("the assertion does not grant any roles");
    }

    let role = if roles.len() > 1 {
        println!();
        println!("Please choose the role you would like to assume:");
        for (index, role) in roles.iter().enumerate() {
            println!("[ {index} ]: {}", role.role_arn);
        }
        let selection = utils::prompt_line("Selection: ")?;
        let index = selection.parse().wrap_err("the role selection must be a number")?;
        select_role(&roles, Some(index))?
    } else {
        select_role(&roles, None)?
    };

    let credentials = assume_with_saml(&aws.region, role, &assertion_b64).await?;
    write_profile(
        &aws.credentials_file,
        &aws.section,
        &ProfileValues {
            output: aws.output.clone(),
            region: aws.region.clone(),
            access_key_id: credentials.access_key_id,
            secret_access_key: credentials.secret_access_key,
            session_token: credentials.session_token,
        },
    )?;

    println!(
        "Temporary credentials for {} saved to the [{}] section of {}",
        role.role_arn,
        aws.section,
        aws.credentials_file.display()
    );
    Ok(())
}
