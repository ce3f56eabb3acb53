//! SQL schema definitions.

/// Columns shared by `petitions` and `petition_templates`.
macro_rules! content_columns {
    () => {
        "
    text TEXT NOT NULL DEFAULT '',
    side_text TEXT NOT NULL DEFAULT '',
    footer_text TEXT NOT NULL DEFAULT '',
    footer_links TEXT NOT NULL DEFAULT '',
    sign_form_footer TEXT NOT NULL DEFAULT '',
    linear_gradient_direction TEXT NOT NULL DEFAULT 'no gradient',
    gradient_from TEXT NOT NULL DEFAULT '',
    gradient_to TEXT NOT NULL DEFAULT '',
    bgcolor TEXT NOT NULL DEFAULT '',
    twitter_description TEXT NOT NULL DEFAULT '',
    twitter_image TEXT NOT NULL DEFAULT '',
    org_twitter_handle TEXT NOT NULL DEFAULT '',
    has_newsletter INTEGER NOT NULL DEFAULT 0,
    newsletter_text TEXT NOT NULL DEFAULT '',
    newsletter_subscribe_method TEXT NOT NULL DEFAULT 'MAIL'
        CHECK (newsletter_subscribe_method IN ('MAIL', 'POST', 'GET')),
    newsletter_subscribe_http_data TEXT NOT NULL DEFAULT '',
    newsletter_subscribe_http_mailfield TEXT NOT NULL DEFAULT '',
    newsletter_subscribe_http_url TEXT NOT NULL DEFAULT '',
    newsletter_subscribe_mail_subject TEXT NOT NULL DEFAULT '',
    newsletter_subscribe_mail_from TEXT NOT NULL DEFAULT '',
    newsletter_subscribe_mail_to TEXT NOT NULL DEFAULT '',
    newsletter_subscribe_mail_smtp_host TEXT NOT NULL DEFAULT 'localhost',
    newsletter_subscribe_mail_smtp_port INTEGER NOT NULL DEFAULT 25,
    newsletter_subscribe_mail_smtp_user TEXT NOT NULL DEFAULT '',
    newsletter_subscribe_mail_smtp_password TEXT NOT NULL DEFAULT '',
    newsletter_subscribe_mail_smtp_tls INTEGER NOT NULL DEFAULT 0,
    newsletter_subscribe_mail_smtp_starttls INTEGER NOT NULL DEFAULT 0,
    confirmation_email_sender TEXT NOT NULL DEFAULT '',
    confirmation_email_smtp_host TEXT NOT NULL DEFAULT 'localhost',
    confirmation_email_smtp_port INTEGER NOT NULL DEFAULT 25,
    confirmation_email_smtp_user TEXT NOT NULL DEFAULT '',
    confirmation_email_smtp_password TEXT NOT NULL DEFAULT '',
    confirmation_email_smtp_tls INTEGER NOT NULL DEFAULT 0,
    confirmation_email_smtp_starttls INTEGER NOT NULL DEFAULT 0,
    use_custom_email_settings INTEGER NOT NULL DEFAULT 0"
    };
}

/// Complete schema for Pytition v1 database.
pub const SCHEMA_V1: &str = concat!(
    r#"
-- ============================================================
-- Accounts & profiles
-- ============================================================

CREATE TABLE IF NOT EXISTS accounts (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT NOT NULL UNIQUE,
    first_name TEXT NOT NULL DEFAULT '',
    last_name TEXT NOT NULL DEFAULT '',
    email TEXT NOT NULL DEFAULT '',
    is_active INTEGER NOT NULL DEFAULT 1,
    date_joined INTEGER NOT NULL
);

-- ============================================================
-- Petitions & signatures
-- ============================================================

CREATE TABLE IF NOT EXISTS petitions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    target INTEGER NOT NULL DEFAULT 500 CHECK (target >= 0),
    published INTEGER NOT NULL DEFAULT 0,"#,
    content_columns!(),
    r#"
);

CREATE TABLE IF NOT EXISTS signatures (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    petition_id INTEGER NOT NULL REFERENCES petitions(id) ON DELETE CASCADE,
    first_name TEXT NOT NULL,
    last_name TEXT NOT NULL,
    phone TEXT NOT NULL DEFAULT '',
    email TEXT NOT NULL,
    confirmation_hash TEXT NOT NULL,
    confirmed INTEGER NOT NULL DEFAULT 0,
    subscribed_to_mailinglist INTEGER NOT NULL DEFAULT 0,
    date INTEGER NOT NULL
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_signatures_token
    ON signatures(petition_id, confirmation_hash);
CREATE INDEX IF NOT EXISTS idx_signatures_email ON signatures(petition_id, email);
-- At most one confirmed signature per (petition, email).
CREATE UNIQUE INDEX IF NOT EXISTS idx_signatures_one_confirmed
    ON signatures(petition_id, email) WHERE confirmed = 1;

-- ============================================================
-- Templates
-- ============================================================

CREATE TABLE IF NOT EXISTS petition_templates (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    target INTEGER CHECK (target IS NULL OR target >= 0),"#,
    content_columns!(),
    r#"
);

CREATE INDEX IF NOT EXISTS idx_petition_templates_name ON petition_templates(name);

-- ============================================================
-- Organizations & permissions
-- ============================================================

CREATE TABLE IF NOT EXISTS organizations (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    default_template_id INTEGER REFERENCES petition_templates(id) ON DELETE SET NULL
);

CREATE INDEX IF NOT EXISTS idx_organizations_name ON organizations(name);

CREATE TABLE IF NOT EXISTS organization_petitions (
    organization_id INTEGER NOT NULL REFERENCES organizations(id) ON DELETE CASCADE,
    petition_id INTEGER NOT NULL REFERENCES petitions(id) ON DELETE CASCADE,
    PRIMARY KEY (organization_id, petition_id)
);

CREATE TABLE IF NOT EXISTS permissions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    organization_id INTEGER NOT NULL REFERENCES organizations(id) ON DELETE CASCADE,
    can_add_members INTEGER NOT NULL DEFAULT 0,
    can_remove_members INTEGER NOT NULL DEFAULT 0,
    can_create_petitions INTEGER NOT NULL DEFAULT 0,
    can_modify_petitions INTEGER NOT NULL DEFAULT 0,
    can_delete_petitions INTEGER NOT NULL DEFAULT 0,
    can_create_templates INTEGER NOT NULL DEFAULT 0,
    can_modify_templates INTEGER NOT NULL DEFAULT 0,
    can_delete_templates INTEGER NOT NULL DEFAULT 0,
    can_view_signatures INTEGER NOT NULL DEFAULT 0,
    can_modify_signatures INTEGER NOT NULL DEFAULT 0,
    can_delete_signatures INTEGER NOT NULL DEFAULT 0,
    can_modify_permissions INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_permissions_org ON permissions(organization_id);

-- ============================================================
-- Pytition users (one per account)
-- ============================================================

CREATE TABLE IF NOT EXISTS pytition_users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    account_id INTEGER NOT NULL UNIQUE REFERENCES accounts(id) ON DELETE CASCADE,
    default_template_id INTEGER REFERENCES petition_templates(id) ON DELETE SET NULL,
    updated_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS user_petitions (
    user_id INTEGER NOT NULL REFERENCES pytition_users(id) ON DELETE CASCADE,
    petition_id INTEGER NOT NULL REFERENCES petitions(id) ON DELETE CASCADE,
    PRIMARY KEY (user_id, petition_id)
);

CREATE TABLE IF NOT EXISTS user_organizations (
    user_id INTEGER NOT NULL REFERENCES pytition_users(id) ON DELETE CASCADE,
    organization_id INTEGER NOT NULL REFERENCES organizations(id) ON DELETE CASCADE,
    PRIMARY KEY (user_id, organization_id)
);

CREATE INDEX IF NOT EXISTS idx_user_organizations_org ON user_organizations(organization_id);

CREATE TABLE IF NOT EXISTS user_permissions (
    user_id INTEGER NOT NULL REFERENCES pytition_users(id) ON DELETE CASCADE,
    permission_id INTEGER NOT NULL REFERENCES permissions(id) ON DELETE CASCADE,
    PRIMARY KEY (user_id, permission_id)
);

CREATE TABLE IF NOT EXISTS user_invitations (
    user_id INTEGER NOT NULL REFERENCES pytition_users(id) ON DELETE CASCADE,
    organization_id INTEGER NOT NULL REFERENCES organizations(id) ON DELETE CASCADE,
    PRIMARY KEY (user_id, organization_id)
);

-- A member's permission rows go away with the member.
CREATE TRIGGER IF NOT EXISTS trg_pytition_users_drop_permissions
BEFORE DELETE ON pytition_users
BEGIN
    DELETE FROM permissions
    WHERE id IN (SELECT permission_id FROM user_permissions WHERE user_id = OLD.id);
END;

-- ============================================================
-- Template ownership
-- ============================================================

CREATE TABLE IF NOT EXISTS template_ownerships (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER REFERENCES pytition_users(id) ON DELETE CASCADE,
    organization_id INTEGER REFERENCES organizations(id) ON DELETE CASCADE,
    template_id INTEGER NOT NULL REFERENCES petition_templates(id) ON DELETE CASCADE,
    CHECK ((user_id IS NULL) <> (organization_id IS NULL))
);

CREATE INDEX IF NOT EXISTS idx_template_ownerships_template ON template_ownerships(template_id);
CREATE INDEX IF NOT EXISTS idx_template_ownerships_user ON template_ownerships(user_id);
CREATE INDEX IF NOT EXISTS idx_template_ownerships_org ON template_ownerships(organization_id);
"#
);
