//! Standard tag registry
//!
//! The checked tag setter accepts a name when the record already carries it
//! or when it appears here. Keywords use their canonical spelling and are
//! matched case-sensitively.

/// Standard metadata tag keywords the pipeline may introduce on a record.
pub const STANDARD_TAGS: &[&str] = &[
    "AccessionNumber",
    "AcquisitionDate",
    "AcquisitionTime",
    "BodyPartExamined",
    "DeviceSerialNumber",
    "EthnicGroup",
    "InstanceNumber",
    "InstitutionAddress",
    "InstitutionName",
    "InstitutionalDepartmentName",
    "Manufacturer",
    "ManufacturerModelName",
    "Modality",
    "OperatorsName",
    "OtherPatientIDs",
    "PatientAge",
    "PatientBirthDate",
    "PatientID",
    "PatientName",
    "PatientPosition",
    "PatientSex",
    "PatientWeight",
    "PerformingPhysicianName",
    "ProtocolName",
    "ReferringPhysicianName",
    "RequestingPhysician",
    "SOPClassUID",
    "SOPInstanceUID",
    "SeriesDate",
    "SeriesDescription",
    "SeriesInstanceUID",
    "SeriesNumber",
    "SeriesTime",
    "SoftwareVersions",
    "StationName",
    "StudyDate",
    "StudyDescription",
    "StudyID",
    "StudyInstanceUID",
    "StudyTime",
];

/// Whether `name` is a standard keyword.
pub fn is_standard(name: &str) -> bool {
    STANDARD_TAGS.contains(&name)
}
