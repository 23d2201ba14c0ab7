//! # 入学申请服务
//!
//! 公开提交入口无需登录；其余操作均需对应权限。

use chrono::{NaiveDate, Utc};
use entity::admission_applications::{self, Entity as AdmissionApplications, Gender};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::auth::{Principal, permissions as perms};
use crate::error::{Context, FieldErrors, PortalError, Result};
use crate::web::server::AppState;

use super::shared::forms::{email_address, not_blank, parse_date};
use super::shared::{PaginationInfo, PaginationParams, ServiceResponse, build_page, search_condition, validate_fields};

const SEARCH_FIELDS: [admission_applications::Column; 3] = [
    admission_applications::Column::FirstName,
    admission_applications::Column::LastName,
    admission_applications::Column::Email,
];

/// 性别选项（表单下拉框）
#[derive(Debug, Clone, Serialize)]
pub struct GenderChoice {
    pub value: &'static str,
    pub label: &'static str,
}

#[must_use]
pub fn gender_choices() -> Vec<GenderChoice> {
    [Gender::Male, Gender::Female, Gender::Other]
        .into_iter()
        .map(|g| GenderChoice {
            value: g.code(),
            label: g.label(),
        })
        .collect()
}

/// 申请提交数据
///
/// 表单与 JSON 共用；日期与性别以字符串接收，校验失败时按字段报错。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdmissionInput {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub date_of_birth: Option<String>,
    pub gender: Option<String>,
    pub address: Option<String>,
    pub previous_school: Option<String>,
    pub grade_applying_for: Option<String>,
    pub parent_name: Option<String>,
    pub parent_phone: Option<String>,
    pub parent_email: Option<String>,
}

#[derive(Debug, Validate)]
struct AdmissionFields {
    #[validate(custom(function = "not_blank"))]
    #[validate(length(max = 50, message = "Ensure this field has no more than 50 characters."))]
    first_name: String,
    #[validate(custom(function = "not_blank"))]
    #[validate(length(max = 50, message = "Ensure this field has no more than 50 characters."))]
    last_name: String,
    #[validate(custom(function = "not_blank"))]
    #[validate(custom(function = "email_address"))]
    #[validate(length(max = 254, message = "Ensure this field has no more than 254 characters."))]
    email: String,
    #[validate(custom(function = "not_blank"))]
    #[validate(length(max = 15, message = "Ensure this field has no more than 15 characters."))]
    phone: String,
    #[validate(custom(function = "not_blank"))]
    address: String,
    #[validate(length(max = 200, message = "Ensure this field has no more than 200 characters."))]
    previous_school: String,
    #[validate(custom(function = "not_blank"))]
    #[validate(length(max = 20, message = "Ensure this field has no more than 20 characters."))]
    grade_applying_for: String,
    #[validate(custom(function = "not_blank"))]
    #[validate(length(max = 100, message = "Ensure this field has no more than 100 characters."))]
    parent_name: String,
    #[validate(custom(function = "not_blank"))]
    #[validate(length(max = 15, message = "Ensure this field has no more than 15 characters."))]
    parent_phone: String,
    #[validate(custom(function = "not_blank"))]
    #[validate(custom(function = "email_address"))]
    #[validate(length(max = 254, message = "Ensure this field has no more than 254 characters."))]
    parent_email: String,
}

/// 校验通过的申请数据
struct CleanAdmission {
    fields: AdmissionFields,
    date_of_birth: NaiveDate,
    gender: Gender,
}

fn pick(value: Option<&String>, existing: Option<String>) -> String {
    value
        .cloned()
        .or(existing)
        .unwrap_or_default()
        .trim()
        .to_string()
}

impl AdmissionInput {
    /// 合并已有记录并校验，收集全部字段错误
    fn clean(&self, existing: Option<&admission_applications::Model>) -> Result<CleanAdmission> {
        let fields = AdmissionFields {
            first_name: pick(self.first_name.as_ref(), existing.map(|a| a.first_name.clone())),
            last_name: pick(self.last_name.as_ref(), existing.map(|a| a.last_name.clone())),
            email: pick(self.email.as_ref(), existing.map(|a| a.email.clone())),
            phone: pick(self.phone.as_ref(), existing.map(|a| a.phone.clone())),
            address: pick(self.address.as_ref(), existing.map(|a| a.address.clone())),
            previous_school: pick(
                self.previous_school.as_ref(),
                existing.map(|a| a.previous_school.clone()),
            ),
            grade_applying_for: pick(
                self.grade_applying_for.as_ref(),
                existing.map(|a| a.grade_applying_for.clone()),
            ),
            parent_name: pick(self.parent_name.as_ref(), existing.map(|a| a.parent_name.clone())),
            parent_phone: pick(self.parent_phone.as_ref(), existing.map(|a| a.parent_phone.clone())),
            parent_email: pick(self.parent_email.as_ref(), existing.map(|a| a.parent_email.clone())),
        };

        let mut errors = validate_fields(&fields);

        let date_of_birth = pick(
            self.date_of_birth.as_ref(),
            existing.map(|a| a.date_of_birth.format("%Y-%m-%d").to_string()),
        );
        let date_of_birth = parse_date(&mut errors, "date_of_birth", &date_of_birth);

        let gender = pick(self.gender.as_ref(), existing.map(|a| a.gender.code().to_string()));
        let gender = parse_gender(&mut errors, &gender);

        errors.into_result()?;

        match (date_of_birth, gender) {
            (Some(date_of_birth), Some(gender)) => Ok(CleanAdmission {
                fields,
                date_of_birth,
                gender,
            }),
            _ => Err(PortalError::internal("admission fields passed validation without values")),
        }
    }
}

fn parse_gender(errors: &mut FieldErrors, value: &str) -> Option<Gender> {
    if value.is_empty() {
        errors.add("gender", super::shared::forms::MSG_REQUIRED);
        return None;
    }
    let gender = Gender::from_code(value);
    if gender.is_none() {
        errors.add(
            "gender",
            format!("Select a valid choice. {value} is not one of the available choices."),
        );
    }
    gender
}

/// 列表过滤条件
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdmissionFilter {
    pub search: Option<String>,
    pub grade: Option<String>,
}

/// 入学申请服务
pub struct AdmissionsService<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> AdmissionsService<'a> {
    #[must_use]
    pub fn new(state: &'a AppState) -> Self {
        Self {
            db: state.database.as_ref(),
        }
    }

    /// 匿名提交申请
    pub async fn submit(&self, input: &AdmissionInput) -> Result<ServiceResponse<admission_applications::Model>> {
        let clean = input.clean(None)?;
        let application = self.insert(clean).await?;
        Ok(ServiceResponse::with_message(
            application,
            "Your admission application has been submitted successfully!",
        ))
    }

    /// 仪表盘录入申请
    pub async fn create(
        &self,
        actor: &Principal,
        input: &AdmissionInput,
    ) -> Result<ServiceResponse<admission_applications::Model>> {
        actor.require_perm(perms::ADD_ADMISSION)?;
        let clean = input.clean(None)?;
        let application = self.insert(clean).await?;
        Ok(ServiceResponse::with_message(
            application,
            "Admission application created successfully!",
        ))
    }

    async fn insert(&self, clean: CleanAdmission) -> Result<admission_applications::Model> {
        let CleanAdmission {
            fields,
            date_of_birth,
            gender,
        } = clean;

        admission_applications::ActiveModel {
            first_name: Set(fields.first_name),
            last_name: Set(fields.last_name),
            email: Set(fields.email),
            phone: Set(fields.phone),
            date_of_birth: Set(date_of_birth),
            gender: Set(gender),
            address: Set(fields.address),
            previous_school: Set(fields.previous_school),
            grade_applying_for: Set(fields.grade_applying_for),
            parent_name: Set(fields.parent_name),
            parent_phone: Set(fields.parent_phone),
            parent_email: Set(fields.parent_email),
            created_at: Set(Utc::now().naive_utc()),
            ..Default::default()
        }
        .insert(self.db)
        .await
        .context("Failed to create admission application")
    }

    pub async fn list(
        &self,
        actor: &Principal,
        filter: &AdmissionFilter,
        params: PaginationParams,
    ) -> Result<(Vec<admission_applications::Model>, PaginationInfo)> {
        actor.require_perm(perms::VIEW_ADMISSION)?;

        let mut select = AdmissionApplications::find();
        if let Some(condition) = search_condition(&SEARCH_FIELDS, filter.search.as_deref()) {
            select = select.filter(condition);
        }
        if let Some(grade) = filter.grade.as_deref().filter(|g| !g.is_empty()) {
            select = select.filter(admission_applications::Column::GradeApplyingFor.eq(grade));
        }

        let total = select
            .clone()
            .count(self.db)
            .await
            .context("Failed to count admission applications")?;

        let items = select
            .order_by_desc(admission_applications::Column::CreatedAt)
            .order_by_desc(admission_applications::Column::Id)
            .offset(params.offset())
            .limit(params.limit)
            .all(self.db)
            .await
            .context("Failed to fetch admission applications")?;

        Ok((items, build_page(total, params)))
    }

    /// 申请总数
    pub async fn count(&self) -> Result<u64> {
        AdmissionApplications::find()
            .count(self.db)
            .await
            .context("Failed to count admission applications")
    }

    pub async fn get(&self, actor: &Principal, id: i32) -> Result<admission_applications::Model> {
        actor.require_perm(perms::VIEW_ADMISSION)?;
        self.fetch(id).await
    }

    pub async fn update(
        &self,
        actor: &Principal,
        id: i32,
        input: &AdmissionInput,
        partial: bool,
    ) -> Result<ServiceResponse<admission_applications::Model>> {
        actor.require_perm(perms::CHANGE_ADMISSION)?;
        let existing = self.fetch(id).await?;

        let clean = input.clean(partial.then_some(&existing))?;
        let CleanAdmission {
            fields,
            date_of_birth,
            gender,
        } = clean;

        let mut active: admission_applications::ActiveModel = existing.into();
        active.first_name = Set(fields.first_name);
        active.last_name = Set(fields.last_name);
        active.email = Set(fields.email);
        active.phone = Set(fields.phone);
        active.date_of_birth = Set(date_of_birth);
        active.gender = Set(gender);
        active.address = Set(fields.address);
        active.previous_school = Set(fields.previous_school);
        active.grade_applying_for = Set(fields.grade_applying_for);
        active.parent_name = Set(fields.parent_name);
        active.parent_phone = Set(fields.parent_phone);
        active.parent_email = Set(fields.parent_email);

        let application = active
            .update(self.db)
            .await
            .context("Failed to update admission application")?;

        Ok(ServiceResponse::with_message(
            application,
            "Admission application updated successfully!",
        ))
    }

    pub async fn delete(&self, actor: &Principal, id: i32) -> Result<ServiceResponse<i32>> {
        actor.require_perm(perms::DELETE_ADMISSION)?;
        let application = self.fetch(id).await?;

        AdmissionApplications::delete_by_id(application.id)
            .exec(self.db)
            .await
            .context("Failed to delete admission application")?;

        Ok(ServiceResponse::with_message(
            application.id,
            "Admission application deleted successfully!",
        ))
    }

    async fn fetch(&self, id: i32) -> Result<admission_applications::Model> {
        AdmissionApplications::find_by_id(id)
            .one(self.db)
            .await
            .context("Failed to fetch admission application")?
            .ok_or_else(|| PortalError::not_found("AdmissionApplication", id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MSG_MAX_15: &str = "Ensure this field has no more than 15 characters.";

    fn valid_input() -> AdmissionInput {
        AdmissionInput {
            first_name: Some("Ada".to_string()),
            last_name: Some("Lovelace".to_string()),
            email: Some("ada@example.com".to_string()),
            phone: Some("555-0100".to_string()),
            date_of_birth: Some("2015-12-10".to_string()),
            gender: Some("F".to_string()),
            address: Some("12 St James's Square".to_string()),
            previous_school: None,
            grade_applying_for: Some("Grade 3".to_string()),
            parent_name: Some("Anne Byron".to_string()),
            parent_phone: Some("555-0101".to_string()),
            parent_email: Some("anne@example.com".to_string()),
        }
    }

    #[test]
    fn test_valid_application_cleans() {
        let clean = valid_input().clean(None).unwrap();
        assert_eq!(clean.gender, Gender::Female);
        assert_eq!(clean.fields.previous_school, "");
    }

    #[test]
    fn test_invalid_fields_are_collected() {
        let input = AdmissionInput {
            email: Some("not-an-email".to_string()),
            parent_email: Some("also bad".to_string()),
            gender: Some("X".to_string()),
            date_of_birth: Some("10/12/2015".to_string()),
            ..valid_input()
        };
        let err = input.clean(None).err().unwrap();
        let fields = err.field_errors().unwrap();
        assert_eq!(fields.get("email").unwrap(), ["Enter a valid email address."]);
        assert!(fields.contains("parent_email"));
        assert!(fields.contains("gender"));
        assert!(fields.contains("date_of_birth"));
    }

    #[test]
    fn test_long_phone_rejected() {
        let input = AdmissionInput {
            phone: Some("1".repeat(16)),
            ..valid_input()
        };
        let err = input.clean(None).err().unwrap();
        assert_eq!(err.field_errors().unwrap().get("phone").unwrap(), [MSG_MAX_15]);
    }

    #[test]
    fn test_gender_choices_cover_all_codes() {
        let codes: Vec<_> = gender_choices().iter().map(|c| c.value).collect();
        assert_eq!(codes, ["M", "F", "O"]);
    }
}
